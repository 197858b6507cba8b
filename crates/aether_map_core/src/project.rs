//! The project aggregate: ordered layers, one tileset and grid dimensions

use std::path::PathBuf;

use crate::error::LayerError;
use crate::layer::{Layer, LayerId, LayerKind};
use crate::tileset::Tileset;

/// A complete tile map being edited
#[cfg_attr(feature = "bevy", derive(bevy::prelude::Resource))]
#[derive(Debug, Clone)]
pub struct Project {
    pub name: String,
    grid_width: u32,
    grid_height: u32,
    /// Tile size in pixels used for placement and rendering
    pub tile_width: u32,
    pub tile_height: u32,
    layers: Vec<Layer>,
    pub tileset: Option<Tileset>,
    /// Free-form project metadata
    pub metadata: serde_json::Map<String, serde_json::Value>,
    /// Directory the project was last saved to or opened from
    pub path: Option<PathBuf>,
    dirty: bool,
}

impl Project {
    pub fn new(
        name: impl Into<String>,
        grid_width: u32,
        grid_height: u32,
        tile_width: u32,
        tile_height: u32,
    ) -> Self {
        Self {
            name: name.into(),
            grid_width,
            grid_height,
            tile_width,
            tile_height,
            layers: Vec::new(),
            tileset: None,
            metadata: serde_json::Map::new(),
            path: None,
            dirty: false,
        }
    }

    pub fn grid_width(&self) -> u32 {
        self.grid_width
    }

    pub fn grid_height(&self) -> u32 {
        self.grid_height
    }

    /// Mark project as modified
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Clear the modified flag (after a save)
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Check if project has unsaved changes
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Layers in their stored order
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> impl Iterator<Item = &mut Layer> {
        self.layers.iter_mut()
    }

    /// Layers sorted by ascending `z_index` (bottom first)
    pub fn layers_in_draw_order(&self) -> Vec<&Layer> {
        let mut ordered: Vec<&Layer> = self.layers.iter().collect();
        ordered.sort_by_key(|layer| layer.z_index);
        ordered
    }

    /// Create a layer sized to the project grid and put it on top of the stack.
    ///
    /// Layer names key the on-disk layer files, so empty and duplicate names are rejected.
    pub fn add_layer(
        &mut self,
        name: impl Into<String>,
        kind: LayerKind,
    ) -> Result<LayerId, LayerError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(LayerError::EmptyName);
        }
        if self.find_layer_by_name(&name).is_some() {
            return Err(LayerError::DuplicateName(name));
        }

        let mut layer = Layer::new(name, kind, self.grid_width, self.grid_height);
        layer.z_index = self.layers.len() as i32;
        let id = layer.id();
        self.layers.push(layer);
        self.dirty = true;
        Ok(id)
    }

    /// Append an already built layer (used by loaders), keeping its `z_index`.
    ///
    /// The layer grid must match the project grid size.
    pub fn push_layer(&mut self, layer: Layer) -> Result<LayerId, LayerError> {
        if layer.width() != self.grid_width || layer.height() != self.grid_height {
            return Err(LayerError::SizeMismatch {
                expected_width: self.grid_width,
                expected_height: self.grid_height,
                found_width: layer.width(),
                found_height: layer.height(),
            });
        }
        let id = layer.id();
        self.layers.push(layer);
        Ok(id)
    }

    /// Remove a layer and re-assign `z_index` 0..n-1 to the survivors in order.
    ///
    /// Unknown IDs are ignored.
    pub fn remove_layer(&mut self, id: LayerId) -> Option<Layer> {
        let pos = self.layer_index(id)?;
        let removed = self.layers.remove(pos);
        for (i, layer) in self.layers.iter_mut().enumerate() {
            layer.z_index = i as i32;
        }
        self.dirty = true;
        Some(removed)
    }

    /// Stable sort of the layer list by `z_index`
    pub fn sort_layers_by_z(&mut self) {
        self.layers.sort_by_key(|layer| layer.z_index);
    }

    pub fn layer_index(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id() == id)
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id() == id)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id() == id)
    }

    /// First layer with the given name, in layer order
    pub fn find_layer_by_name(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// True if any layer holds at least one tile
    pub fn has_painted_tiles(&self) -> bool {
        self.layers.iter().any(|l| !l.is_empty())
    }

    /// Replace the tileset, returning the previous one
    pub fn set_tileset(&mut self, tileset: Tileset) -> Option<Tileset> {
        self.dirty = true;
        self.tileset.replace(tileset)
    }
}
