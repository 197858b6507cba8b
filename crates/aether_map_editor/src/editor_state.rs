//! Per-window editing cursor: active layer, selected tile, tool and pointer cell

use aether_map_core::{Layer, LayerId, Project, TileId};

use crate::tools::ToolKind;

/// Mutable editor cursor for one open project window.
///
/// The active layer is stored as a [`LayerId`] and re-resolved against the project on
/// every access; if the layer has been removed the handle is cleared.
#[cfg_attr(feature = "bevy", derive(bevy::prelude::Resource))]
#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
    active_layer: Option<LayerId>,
    selected_tile: Option<TileId>,
    active_tool: ToolKind,
    pub show_grid: bool,
    /// Last grid cell the pointer moved over
    pub pointer_cell: (i32, i32),
}

impl Default for EditorState {
    fn default() -> Self {
        Self {
            active_layer: None,
            selected_tile: None,
            active_tool: ToolKind::Paint,
            show_grid: true,
            pointer_cell: (0, 0),
        }
    }
}

impl EditorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `id` the active layer.
    ///
    /// Rejected (returns `false`, state unchanged) if the layer does not exist or is locked.
    pub fn set_active_layer(&mut self, project: &Project, id: LayerId) -> bool {
        match project.layer(id) {
            Some(layer) if !layer.locked => {
                self.active_layer = Some(id);
                true
            }
            Some(layer) => {
                tracing::debug!("Refusing to activate locked layer '{}'", layer.name);
                false
            }
            None => false,
        }
    }

    pub fn clear_active_layer(&mut self) {
        self.active_layer = None;
    }

    /// Raw handle without checking that the layer still exists
    pub fn active_layer_id(&self) -> Option<LayerId> {
        self.active_layer
    }

    /// Resolve the active layer, clearing the handle if the layer is gone
    pub fn active_layer<'p>(&mut self, project: &'p Project) -> Option<&'p Layer> {
        let id = self.active_layer?;
        let layer = project.layer(id);
        if layer.is_none() {
            self.active_layer = None;
        }
        layer
    }

    /// Drop the active-layer handle if its layer no longer exists
    pub fn refresh_active_layer(&mut self, project: &Project) {
        if self.active_layer.is_some_and(|id| project.layer(id).is_none()) {
            self.active_layer = None;
        }
    }

    /// Mutable variant of [`EditorState::active_layer`]
    pub fn active_layer_mut<'p>(&mut self, project: &'p mut Project) -> Option<&'p mut Layer> {
        let id = self.active_layer?;
        let layer = project.layer_mut(id);
        if layer.is_none() {
            self.active_layer = None;
        }
        layer
    }

    pub fn selected_tile(&self) -> Option<TileId> {
        self.selected_tile
    }

    /// Select a tile from the palette
    pub fn select_tile(&mut self, id: TileId) {
        self.selected_tile = Some(id);
    }

    pub fn clear_selected_tile(&mut self) {
        self.selected_tile = None;
    }

    pub fn active_tool(&self) -> ToolKind {
        self.active_tool
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        self.active_tool = tool;
    }

    pub fn toggle_grid(&mut self) {
        self.show_grid = !self.show_grid;
    }
}
