//! Binary layer file: a 32-byte little-endian header followed by the cells as `i32`s.
//!
//! | offset | size | field                                 |
//! |--------|------|---------------------------------------|
//! | 0      | 4    | magic `AELR`                          |
//! | 4      | 4    | format version (1)                    |
//! | 8      | 4    | width                                 |
//! | 12     | 4    | height                                |
//! | 16     | 1    | compression flag (0 raw, 1 zlib)      |
//! | 17     | 15   | reserved, zero                        |

use std::io::{Read, Write};
use std::path::Path;

use aether_map_core::{Layer, LayerKind, TileGrid, TileId};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::ProjectError;

pub const LAYER_MAGIC: [u8; 4] = *b"AELR";
pub const LAYER_FORMAT_VERSION: u32 = 1;
pub const LAYER_HEADER_SIZE: usize = 32;
pub const LAYER_FILE_EXTENSION: &str = "layer";

/// Serialize a grid to the layer file format.
///
/// `compression` is a DEFLATE level (0-9); `None` stores the body raw.
pub fn encode_grid(grid: &TileGrid, compression: Option<u32>) -> Result<Vec<u8>, ProjectError> {
    let mut body = Vec::with_capacity(grid.cells().len() * 4);
    for &cell in grid.cells() {
        let value = i32::try_from(cell)
            .map_err(|_| ProjectError::format(format!("tile id {cell} does not fit in 32-bit signed cell")))?;
        body.extend_from_slice(&value.to_le_bytes());
    }

    let mut out = Vec::with_capacity(LAYER_HEADER_SIZE + body.len());
    out.extend_from_slice(&LAYER_MAGIC);
    out.extend_from_slice(&LAYER_FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&grid.width().to_le_bytes());
    out.extend_from_slice(&grid.height().to_le_bytes());
    out.push(u8::from(compression.is_some()));
    out.resize(LAYER_HEADER_SIZE, 0);

    match compression {
        Some(level) => {
            let mut encoder = ZlibEncoder::new(out, Compression::new(level.min(9)));
            encoder.write_all(&body)?;
            Ok(encoder.finish()?)
        }
        None => {
            out.extend_from_slice(&body);
            Ok(out)
        }
    }
}

/// Parse a layer file produced by [`encode_grid`]
pub fn decode_grid(bytes: &[u8]) -> Result<TileGrid, ProjectError> {
    if bytes.len() < LAYER_HEADER_SIZE {
        return Err(ProjectError::format(format!(
            "layer file is {} bytes, shorter than its {LAYER_HEADER_SIZE}-byte header",
            bytes.len()
        )));
    }
    let (header, body) = bytes.split_at(LAYER_HEADER_SIZE);

    if header[0..4] != LAYER_MAGIC {
        return Err(ProjectError::format(format!(
            "bad layer magic {:?}",
            String::from_utf8_lossy(&header[0..4])
        )));
    }
    let version = read_u32(header, 4);
    if version != LAYER_FORMAT_VERSION {
        return Err(ProjectError::format(format!("unsupported layer version {version}")));
    }
    let width = read_u32(header, 8);
    let height = read_u32(header, 12);

    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|cells| cells.checked_mul(4))
        .ok_or_else(|| ProjectError::format(format!("layer size {width}x{height} is too large")))?;

    let raw = match header[16] {
        0 => body.to_vec(),
        1 => {
            // Read one byte past the expected size so oversized bodies are detected.
            // The header is untrusted, so the buffer grows with the data actually read.
            let mut raw = Vec::new();
            ZlibDecoder::new(body)
                .take(expected as u64 + 1)
                .read_to_end(&mut raw)
                .map_err(|e| ProjectError::format(format!("corrupt compressed layer body: {e}")))?;
            raw
        }
        flag => return Err(ProjectError::format(format!("unknown compression flag {flag}"))),
    };
    if raw.len() != expected {
        return Err(ProjectError::format(format!(
            "layer body is {} bytes, expected {expected} for {width}x{height}",
            raw.len()
        )));
    }

    let mut cells = Vec::with_capacity(expected / 4);
    for chunk in raw.chunks_exact(4) {
        let value = i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        let id = TileId::try_from(value)
            .map_err(|_| ProjectError::format(format!("negative tile id {value} in layer body")))?;
        cells.push(id);
    }
    TileGrid::from_cells(width, height, cells)
        .ok_or_else(|| ProjectError::format("layer body does not match its dimensions"))
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Write one layer's grid to `path`
pub fn save_layer(layer: &Layer, path: &Path, compression: Option<u32>) -> Result<(), ProjectError> {
    let bytes = encode_grid(layer.grid(), compression)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Read a layer file. The layer is named after the file stem and has default properties.
pub fn load_layer(path: &Path) -> Result<Layer, ProjectError> {
    if !path.exists() {
        return Err(ProjectError::NotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;
    let grid = decode_grid(&bytes)?;
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(Layer::from_grid(name, LayerKind::default(), grid))
}
