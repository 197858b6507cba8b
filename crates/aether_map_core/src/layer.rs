//! Tile layers: a grid plus display and editing metadata

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::grid::{TileGrid, TileId};

/// Stable identity of a layer within a project.
///
/// IDs are runtime handles only; they are regenerated whenever a project is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(Uuid);

impl LayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// What a layer is used for in the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Background,
    Parallax,
    Environment,
    /// Main gameplay layer
    #[default]
    Actual,
    Collision,
    Foreground,
    Particle,
    Ui,
    Custom,
}

impl LayerKind {
    pub const ALL: [LayerKind; 9] = [
        LayerKind::Background,
        LayerKind::Parallax,
        LayerKind::Environment,
        LayerKind::Actual,
        LayerKind::Collision,
        LayerKind::Foreground,
        LayerKind::Particle,
        LayerKind::Ui,
        LayerKind::Custom,
    ];

    /// Name used in project files
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Background => "background",
            LayerKind::Parallax => "parallax",
            LayerKind::Environment => "environment",
            LayerKind::Actual => "actual",
            LayerKind::Collision => "collision",
            LayerKind::Foreground => "foreground",
            LayerKind::Particle => "particle",
            LayerKind::Ui => "ui",
            LayerKind::Custom => "custom",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LayerKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("Unknown layer type: {}", s))
    }
}

/// A named tile grid with visibility, lock, opacity and stacking order
#[derive(Debug, Clone)]
pub struct Layer {
    id: LayerId,
    pub name: String,
    pub kind: LayerKind,
    grid: TileGrid,
    pub visible: bool,
    pub locked: bool,
    opacity: f32,
    /// Stacking order; lower draws first
    pub z_index: i32,
    /// Whether gameplay on this layer interacts with other layers
    pub interacts_with_layers: bool,
}

impl Layer {
    /// Create an empty layer of the given size
    pub fn new(name: impl Into<String>, kind: LayerKind, width: u32, height: u32) -> Self {
        Self::from_grid(name, kind, TileGrid::new(width, height))
    }

    /// Wrap existing grid content in a layer with default properties
    pub fn from_grid(name: impl Into<String>, kind: LayerKind, grid: TileGrid) -> Self {
        Self {
            id: LayerId::new(),
            name: name.into(),
            kind,
            grid,
            visible: true,
            locked: false,
            opacity: 1.0,
            z_index: 0,
            interacts_with_layers: true,
        }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.grid.width()
    }

    pub fn height(&self) -> u32 {
        self.grid.height()
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        self.grid.in_bounds(x, y)
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn get_tile(&self, x: i32, y: i32) -> TileId {
        self.grid.get(x, y)
    }

    pub fn set_tile(&mut self, x: i32, y: i32, id: TileId) {
        self.grid.set(x, y, id);
    }

    /// Clear all tiles from the layer
    pub fn clear(&mut self) {
        self.grid.clear();
    }

    /// True if the layer holds no tiles
    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Set opacity, clamped to `[0, 1]`
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = if opacity.is_nan() {
            1.0
        } else {
            opacity.clamp(0.0, 1.0)
        };
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.set_opacity(opacity);
        self
    }
}
