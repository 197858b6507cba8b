//! Single-file project archive.
//!
//! A zip archive with these entries:
//!
//! - `project_metadata`: the [`ProjectMetadata`] JSON
//! - `tileset/image`: the tileset image file bytes
//! - `tileset/metadata`: [`TilesetInfo`] JSON
//! - `tileset/tile_definitions`: JSON object of tile definitions keyed by tile ID
//! - `layers/<name>/tile_grid`: the layer grid in the binary layer format, compressed
//! - `layers/<name>/properties`: [`LayerInfo`] JSON

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use aether_map_core::{Layer, Project, TileDefinition, TileId, Tileset, TilesetError};
use image::ImageFormat;
use serde::de::DeserializeOwned;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::binary::{decode_grid, encode_grid};
use super::metadata::{layer_file_name, LayerInfo, ProjectMetadata, TilesetInfo};
use crate::error::ProjectError;

const PROJECT_METADATA: &str = "project_metadata";
const TILESET_IMAGE: &str = "tileset/image";
const TILESET_METADATA: &str = "tileset/metadata";
const TILE_DEFINITIONS: &str = "tileset/tile_definitions";
const LAYERS_PREFIX: &str = "layers/";
const TILE_GRID: &str = "tile_grid";
const PROPERTIES: &str = "properties";

/// Bundle the whole project, tileset image included, into one archive at `path`
pub fn export_container(project: &Project, path: &Path, level: u32) -> Result<(), ProjectError> {
    let file = File::create(path)?;
    write_container(project, file, level)?;
    tracing::info!("Exported project '{}' to {}", project.name, path.display());
    Ok(())
}

/// Read an archive written by [`export_container`]
pub fn import_container(path: &Path) -> Result<Project, ProjectError> {
    if !path.exists() {
        return Err(ProjectError::NotFound(path.to_path_buf()));
    }
    let project = read_container(File::open(path)?)?;
    tracing::info!(
        "Imported project '{}' ({} layers) from {}",
        project.name,
        project.layers().len(),
        path.display()
    );
    Ok(project)
}

pub fn write_container<W: Write + Seek>(project: &Project, writer: W, level: u32) -> Result<W, ProjectError> {
    let level = level.min(9);
    let json = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(level as i64));
    // Already compressed payloads
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    let mut zip = ZipWriter::new(writer);
    let metadata = ProjectMetadata::from_project(project)?;
    zip.start_file(PROJECT_METADATA, json)?;
    zip.write_all(metadata.to_json()?.as_bytes())?;

    if let Some(tileset) = &project.tileset {
        if let Some(bytes) = tileset_image_bytes(tileset)? {
            zip.start_file(TILESET_IMAGE, stored)?;
            zip.write_all(&bytes)?;
        }

        zip.start_file(TILESET_METADATA, json)?;
        zip.write_all(&serde_json::to_vec_pretty(&TilesetInfo::from_tileset(tileset))?)?;

        let definitions: BTreeMap<String, &TileDefinition> = tileset
            .tiles()
            .map(|tile| (tile.id.to_string(), tile))
            .collect();
        zip.start_file(TILE_DEFINITIONS, json)?;
        zip.write_all(&serde_json::to_vec(&definitions)?)?;
    }

    for layer in project.layers() {
        // Validates the name for use as an entry path
        layer_file_name(&layer.name)?;
        let group = format!("{LAYERS_PREFIX}{}", layer.name);

        zip.start_file(format!("{group}/{TILE_GRID}"), stored)?;
        zip.write_all(&encode_grid(layer.grid(), Some(level))?)?;

        zip.start_file(format!("{group}/{PROPERTIES}"), json)?;
        zip.write_all(&serde_json::to_vec_pretty(&LayerInfo::from_layer(layer)?)?)?;
    }

    Ok(zip.finish()?)
}

pub fn read_container<R: Read + Seek>(reader: R) -> Result<Project, ProjectError> {
    let mut archive =
        ZipArchive::new(reader).map_err(|e| ProjectError::format(format!("corrupt archive: {e}")))?;

    let metadata_bytes = read_entry(&mut archive, PROJECT_METADATA)?
        .ok_or_else(|| ProjectError::format("archive has no project_metadata entry"))?;
    let metadata: ProjectMetadata = parse_entry(&metadata_bytes, PROJECT_METADATA)?;
    let mut project = metadata.to_empty_project();

    if let Some(tileset) = read_tileset(&mut archive)? {
        project.set_tileset(tileset);
    }

    let groups: Vec<String> = archive
        .file_names()
        .filter_map(|name| {
            name.strip_prefix(LAYERS_PREFIX)?
                .strip_suffix(PROPERTIES)?
                .strip_suffix('/')
                .map(str::to_string)
        })
        .collect();

    for group in groups {
        let properties = read_entry(&mut archive, &format!("{LAYERS_PREFIX}{group}/{PROPERTIES}"))?
            .ok_or_else(|| ProjectError::format(format!("layer '{group}' has no properties")))?;
        let info: LayerInfo = parse_entry(&properties, &group)?;

        let grid_bytes = read_entry(&mut archive, &format!("{LAYERS_PREFIX}{group}/{TILE_GRID}"))?
            .ok_or_else(|| ProjectError::format(format!("layer '{group}' has no tile grid")))?;
        let grid = decode_grid(&grid_bytes)?;

        let mut layer = Layer::from_grid(info.name.clone(), info.kind, grid);
        info.apply_to(&mut layer);
        project.push_layer(layer)?;
    }
    project.sort_layers_by_z();
    project.mark_clean();
    Ok(project)
}

fn read_tileset<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Option<Tileset>, ProjectError> {
    let Some(info_bytes) = read_entry(archive, TILESET_METADATA)? else {
        return Ok(None);
    };
    let info: TilesetInfo = parse_entry(&info_bytes, TILESET_METADATA)?;
    let Some(image_bytes) = read_entry(archive, TILESET_IMAGE)? else {
        tracing::warn!("Archive tileset '{}' has no image; skipping it", info.name);
        return Ok(None);
    };

    let mut tileset = Tileset::new(info.name.clone(), info.path.clone());
    if let Some((w, h)) = info.tile_size() {
        tileset = tileset.with_tile_size(w, h);
    }
    tileset
        .load_from_memory(&image_bytes)
        .map_err(|e| ProjectError::Decode(e.to_string()))?;

    match read_entry(archive, TILE_DEFINITIONS)? {
        Some(bytes) => {
            let raw: BTreeMap<String, TileDefinition> = parse_entry(&bytes, TILE_DEFINITIONS)?;
            let mut definitions = Vec::with_capacity(raw.len());
            for (key, mut definition) in raw {
                definition.id = key
                    .parse::<TileId>()
                    .map_err(|_| ProjectError::format(format!("bad tile id key '{key}'")))?;
                definitions.push(definition);
            }
            tileset.set_definitions(definitions).map_err(|e| match e {
                TilesetError::RectOutOfBounds { id } => {
                    ProjectError::format(format!("tile {id} lies outside the tileset image"))
                }
                other => other.into(),
            })?;
        }
        None => {
            tileset.slice_from_image();
        }
    }
    Ok(Some(tileset))
}

/// The original image file if it still exists, otherwise the decoded image re-encoded as PNG
fn tileset_image_bytes(tileset: &Tileset) -> Result<Option<Vec<u8>>, ProjectError> {
    if tileset.image_path.is_file() {
        return Ok(Some(std::fs::read(&tileset.image_path)?));
    }
    let Some(image) = tileset.image() else {
        return Ok(None);
    };
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .map_err(|e| ProjectError::Encode(e.to_string()))?;
    Ok(Some(bytes.into_inner()))
}

fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<Vec<u8>>, ProjectError> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(ProjectError::format(format!("corrupt archive entry '{name}': {e}"))),
    };
    let mut bytes = Vec::new();
    entry
        .read_to_end(&mut bytes)
        .map_err(|e| ProjectError::format(format!("corrupt archive entry '{name}': {e}")))?;
    Ok(Some(bytes))
}

fn parse_entry<T: DeserializeOwned>(bytes: &[u8], name: &str) -> Result<T, ProjectError> {
    serde_json::from_slice(bytes).map_err(|e| ProjectError::format(format!("malformed '{name}' entry: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::test_util::write_tileset_png;
    use aether_map_core::LayerKind;

    fn sample_project(dir: &Path) -> Project {
        let png = write_tileset_png(dir, "tiles.png");
        let mut project = Project::new("Archive", 5, 4, 8, 8);
        let ground = project.add_layer("Ground", LayerKind::Actual).unwrap();
        let fog = project.add_layer("Fog", LayerKind::Foreground).unwrap();
        project.layer_mut(ground).unwrap().set_tile(1, 1, 4);
        {
            let fog = project.layer_mut(fog).unwrap();
            fog.set_tile(4, 3, 11);
            fog.visible = false;
        }
        let mut tileset = Tileset::open("tiles", &png, Some((8, 8))).unwrap();
        tileset.tile_mut(4).unwrap().solid = true;
        project.set_tileset(tileset);
        project
    }

    #[test]
    fn test_container_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let project = sample_project(dir.path());
        let path = dir.path().join("archive.aemap");

        export_container(&project, &path, 6).unwrap();
        let loaded = import_container(&path).unwrap();

        assert_eq!(loaded.name, "Archive");
        assert_eq!((loaded.grid_width(), loaded.grid_height()), (5, 4));
        assert_eq!(loaded.layers().len(), 2);
        for (a, b) in project.layers().iter().zip(loaded.layers()) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.grid(), b.grid());
            assert_eq!(a.visible, b.visible);
            assert_eq!(a.z_index, b.z_index);
        }

        let tileset = loaded.tileset.as_ref().unwrap();
        assert_eq!(tileset.tile_count(), 16);
        assert!(tileset.tile_is_solid(4));
        assert!(tileset.tile_surface(16).is_some());
        assert!(!loaded.is_dirty());
    }

    #[test]
    fn test_archive_entries() {
        let dir = tempfile::tempdir().unwrap();
        let project = sample_project(dir.path());
        let bytes = write_container(&project, Cursor::new(Vec::new()), 6)
            .unwrap()
            .into_inner();

        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<_> = archive.file_names().collect();
        names.sort_unstable();
        assert_eq!(
            names,
            [
                "layers/Fog/properties",
                "layers/Fog/tile_grid",
                "layers/Ground/properties",
                "layers/Ground/tile_grid",
                "project_metadata",
                "tileset/image",
                "tileset/metadata",
                "tileset/tile_definitions",
            ]
        );
    }

    #[test]
    fn test_tileset_reencoded_when_file_gone() {
        let dir = tempfile::tempdir().unwrap();
        let project = sample_project(dir.path());
        std::fs::remove_file(dir.path().join("tiles.png")).unwrap();

        let bytes = write_container(&project, Cursor::new(Vec::new()), 6)
            .unwrap()
            .into_inner();
        let loaded = read_container(Cursor::new(bytes)).unwrap();
        assert_eq!(loaded.tileset.as_ref().unwrap().tile_count(), 16);
    }

    #[test]
    fn test_project_without_tileset() {
        let mut project = Project::new("Bare", 3, 3, 16, 16);
        project.add_layer("Only", LayerKind::Actual).unwrap();

        let bytes = write_container(&project, Cursor::new(Vec::new()), 6)
            .unwrap()
            .into_inner();
        let loaded = read_container(Cursor::new(bytes)).unwrap();
        assert!(loaded.tileset.is_none());
        assert_eq!(loaded.layers()[0].name, "Only");
    }

    #[test]
    fn test_not_an_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.aemap");
        std::fs::write(&path, b"definitely not a zip").unwrap();

        assert!(matches!(import_container(&path), Err(ProjectError::Format(_))));
        assert!(matches!(
            import_container(&dir.path().join("missing.aemap")),
            Err(ProjectError::NotFound(_))
        ));
    }

    #[test]
    fn test_malformed_entry_json() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file(PROJECT_METADATA, SimpleFileOptions::default()).unwrap();
        zip.write_all(b"{ \"project\": ").unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        assert!(matches!(read_container(Cursor::new(bytes)), Err(ProjectError::Format(_))));
    }
}
