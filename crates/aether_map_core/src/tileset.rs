//! Tileset image, tile slicing and per-tile definitions

use image::{imageops, RgbaImage, SubImage};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::error::TilesetError;
use crate::grid::TileId;

/// Tile sizes tried by auto-detection, largest first
pub const TILE_SIZE_CANDIDATES: [u32; 5] = [128, 64, 32, 16, 8];

/// Tile size used when no candidate divides the image evenly
pub const FALLBACK_TILE_SIZE: u32 = 32;

/// Pick the largest candidate tile size that divides both image dimensions.
pub fn detect_tile_size(image_width: u32, image_height: u32) -> u32 {
    TILE_SIZE_CANDIDATES
        .iter()
        .copied()
        .find(|size| image_width % size == 0 && image_height % size == 0)
        .unwrap_or(FALLBACK_TILE_SIZE)
}

/// Source rectangle of a tile inside the tileset image, in pixels.
///
/// Serialized as `[x, y, w, h]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u32; 4]", into = "[u32; 4]")]
pub struct TileRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl TileRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Check that the rect is non-empty and fits inside an image of the given size
    pub fn fits_within(&self, image_width: u32, image_height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.x.checked_add(self.width).is_some_and(|r| r <= image_width)
            && self.y.checked_add(self.height).is_some_and(|b| b <= image_height)
    }
}

impl From<[u32; 4]> for TileRect {
    fn from([x, y, width, height]: [u32; 4]) -> Self {
        Self::new(x, y, width, height)
    }
}

impl From<TileRect> for [u32; 4] {
    fn from(rect: TileRect) -> Self {
        [rect.x, rect.y, rect.width, rect.height]
    }
}

/// A single tile cut from the tileset image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileDefinition {
    pub id: TileId,
    pub rect: TileRect,
    /// Whether this tile blocks movement
    #[serde(default)]
    pub solid: bool,
    /// Animation frames for this tile (list of tile IDs)
    #[serde(default)]
    pub animation_frames: Vec<TileId>,
    /// Custom user-defined properties
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl TileDefinition {
    pub fn new(id: TileId, rect: TileRect) -> Self {
        Self {
            id,
            rect,
            solid: false,
            animation_frames: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    /// Check if this tile has an animation
    pub fn has_animation(&self) -> bool {
        self.animation_frames.len() > 1
    }

    pub fn with_solid(mut self, solid: bool) -> Self {
        self.solid = solid;
        self
    }

    pub fn with_animation(mut self, frames: Vec<TileId>) -> Self {
        self.animation_frames = frames;
        self
    }

    /// Set a metadata entry
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A spritesheet plus the tiles sliced from it.
///
/// A tile size of `0` means "not specified yet"; loading the image replaces it with
/// the auto-detected size.
#[derive(Debug, Clone)]
pub struct Tileset {
    pub name: String,
    pub image_path: PathBuf,
    pub tile_width: u32,
    pub tile_height: u32,
    tiles: BTreeMap<TileId, TileDefinition>,
    image: Option<RgbaImage>,
}

impl Tileset {
    /// Create an unloaded tileset with an unspecified tile size
    pub fn new(name: impl Into<String>, image_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            image_path: image_path.into(),
            tile_width: 0,
            tile_height: 0,
            tiles: BTreeMap::new(),
            image: None,
        }
    }

    /// Fix the tile size instead of auto-detecting it on load
    pub fn with_tile_size(mut self, tile_width: u32, tile_height: u32) -> Self {
        self.tile_width = tile_width;
        self.tile_height = tile_height;
        self
    }

    /// Load the image at `path` and slice it.
    ///
    /// `tile_size` of `None` auto-detects the size from the image dimensions.
    pub fn open(
        name: impl Into<String>,
        path: impl AsRef<Path>,
        tile_size: Option<(u32, u32)>,
    ) -> Result<Self, TilesetError> {
        let mut tileset = Self::new(name, path.as_ref());
        if let Some((w, h)) = tile_size {
            tileset = tileset.with_tile_size(w, h);
        }
        tileset.load()?;
        tileset.slice_from_image();
        Ok(tileset)
    }

    /// Decode the image at `image_path`
    pub fn load(&mut self) -> Result<(), TilesetError> {
        if !self.image_path.exists() {
            return Err(TilesetError::NotFound(self.image_path.clone()));
        }
        let image = image::open(&self.image_path)?.to_rgba8();
        self.set_image(image);
        Ok(())
    }

    /// Decode an encoded image (PNG, JPEG, BMP, GIF) held in memory
    pub fn load_from_memory(&mut self, bytes: &[u8]) -> Result<(), TilesetError> {
        let image = image::load_from_memory(bytes)?.to_rgba8();
        self.set_image(image);
        Ok(())
    }

    /// Install an already decoded image, auto-detecting the tile size if unset
    pub fn set_image(&mut self, image: RgbaImage) {
        if self.tile_width == 0 || self.tile_height == 0 {
            let size = detect_tile_size(image.width(), image.height());
            tracing::debug!(
                "Auto-detected tile size {size}x{size} for {}x{} tileset '{}'",
                image.width(),
                image.height(),
                self.name
            );
            self.tile_width = size;
            self.tile_height = size;
        }
        self.image = Some(image);
    }

    pub fn is_loaded(&self) -> bool {
        self.image.is_some()
    }

    pub fn image(&self) -> Option<&RgbaImage> {
        self.image.as_ref()
    }

    /// Generate tile definitions row-major starting at ID 1.
    ///
    /// Remainder pixels on the right and bottom edges are not used. Returns the
    /// number of tiles created; nothing happens while the image is unloaded.
    pub fn slice_from_image(&mut self) -> usize {
        let Some(image) = &self.image else {
            return 0;
        };
        if self.tile_width == 0 || self.tile_height == 0 {
            return 0;
        }

        let cols = image.width() / self.tile_width;
        let rows = image.height() / self.tile_height;

        let mut tile_id: TileId = 1;
        for row in 0..rows {
            for col in 0..cols {
                let rect = TileRect::new(
                    col * self.tile_width,
                    row * self.tile_height,
                    self.tile_width,
                    self.tile_height,
                );
                self.tiles.insert(tile_id, TileDefinition::new(tile_id, rect));
                tile_id += 1;
            }
        }
        (cols * rows) as usize
    }

    /// Re-slice the image with a new tile size.
    ///
    /// All existing tile definitions are dropped and IDs restart at 1, so tile IDs
    /// already placed on layers no longer refer to the same art.
    pub fn subdivide(&mut self, tile_width: u32, tile_height: u32) -> Result<usize, TilesetError> {
        if tile_width == 0 || tile_height == 0 {
            return Err(TilesetError::InvalidTileSize {
                width: tile_width,
                height: tile_height,
            });
        }
        if self.image.is_none() {
            return Err(TilesetError::NotLoaded);
        }
        self.tile_width = tile_width;
        self.tile_height = tile_height;
        self.tiles.clear();
        Ok(self.slice_from_image())
    }

    /// Replace the tile definitions with externally stored ones.
    ///
    /// Every rect must fit inside the loaded image.
    pub fn set_definitions(
        &mut self,
        definitions: impl IntoIterator<Item = TileDefinition>,
    ) -> Result<(), TilesetError> {
        let image = self.image.as_ref().ok_or(TilesetError::NotLoaded)?;
        let (w, h) = image.dimensions();

        let mut tiles = BTreeMap::new();
        for definition in definitions {
            if !definition.rect.fits_within(w, h) {
                return Err(TilesetError::RectOutOfBounds { id: definition.id });
            }
            tiles.insert(definition.id, definition);
        }
        self.tiles = tiles;
        Ok(())
    }

    /// Read-only view of the tile's pixels, or `None` for unknown IDs or an unloaded image
    pub fn tile_surface(&self, id: TileId) -> Option<SubImage<&RgbaImage>> {
        let image = self.image.as_ref()?;
        let rect = self.tiles.get(&id)?.rect;
        if !rect.fits_within(image.width(), image.height()) {
            return None;
        }
        Some(imageops::crop_imm(image, rect.x, rect.y, rect.width, rect.height))
    }

    pub fn tile(&self, id: TileId) -> Option<&TileDefinition> {
        self.tiles.get(&id)
    }

    pub fn tile_mut(&mut self, id: TileId) -> Option<&mut TileDefinition> {
        self.tiles.get_mut(&id)
    }

    /// All tile definitions in ID order
    pub fn tiles(&self) -> impl Iterator<Item = &TileDefinition> {
        self.tiles.values()
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Check if a tile is marked solid
    pub fn tile_is_solid(&self, id: TileId) -> bool {
        self.tiles.get(&id).map(|t| t.solid).unwrap_or(false)
    }
}
