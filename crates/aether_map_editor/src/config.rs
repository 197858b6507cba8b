//! Editor configuration
//!
//! Every field has a default, so a config file only needs the keys it overrides:
//!
//! ```toml
//! zoom_max = 8.0
//! default_tile_size = 16
//!
//! [[default_layers]]
//! name = "Terrain"
//! kind = "actual"
//! ```

use std::path::Path;

use aether_map_core::LayerKind;
use serde::{Deserialize, Serialize};

use crate::error::ProjectError;

pub const ZOOM_MIN: f32 = 0.25;
pub const ZOOM_MAX: f32 = 4.0;
pub const ZOOM_STEP: f32 = 0.25;
pub const DEFAULT_GRID_WIDTH: u32 = 64;
pub const DEFAULT_GRID_HEIGHT: u32 = 64;
pub const DEFAULT_TILE_SIZE: u32 = 32;
/// DEFLATE level used for layer bodies and archived grids
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// A layer created for every new project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultLayer {
    pub name: String,
    #[serde(default)]
    pub kind: LayerKind,
}

impl DefaultLayer {
    pub fn new(name: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Settings that shape editing, rendering and saving
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    // Camera
    pub zoom_min: f32,
    pub zoom_max: f32,
    pub zoom_step: f32,

    // New projects
    pub default_grid_width: u32,
    pub default_grid_height: u32,
    pub default_tile_size: u32,
    pub default_layers: Vec<DefaultLayer>,

    // Saving
    pub compress_layers: bool,
    pub compression_level: u32,

    // Rendering
    pub show_grid: bool,
    /// Grid lines are skipped when a scaled tile is smaller than this many pixels
    pub min_grid_cell_px: u32,
    pub background_color: [u8; 4],
    pub grid_color: [u8; 4],
    pub highlight_color: [u8; 4],
    pub highlight_thickness: u32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            zoom_min: ZOOM_MIN,
            zoom_max: ZOOM_MAX,
            zoom_step: ZOOM_STEP,
            default_grid_width: DEFAULT_GRID_WIDTH,
            default_grid_height: DEFAULT_GRID_HEIGHT,
            default_tile_size: DEFAULT_TILE_SIZE,
            default_layers: vec![
                DefaultLayer::new("Background", LayerKind::Background),
                DefaultLayer::new("Ground", LayerKind::Actual),
            ],
            compress_layers: true,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            show_grid: true,
            min_grid_cell_px: 4,
            background_color: [40, 40, 40, 255],
            grid_color: [100, 100, 100, 255],
            highlight_color: [255, 255, 0, 255],
            highlight_thickness: 2,
        }
    }
}

impl EditorConfig {
    /// Parse a config from TOML text, filling in defaults for missing keys
    pub fn from_toml_str(text: &str) -> Result<Self, ProjectError> {
        let config: EditorConfig = toml::from_str(text)?;
        Ok(config.sanitized())
    }

    /// Load a config file
    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        if !path.exists() {
            return Err(ProjectError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> Result<String, ProjectError> {
        toml::to_string_pretty(self).map_err(|e| ProjectError::format(e.to_string()))
    }

    /// DEFLATE level for layer bodies, or `None` to store them raw
    pub fn layer_compression(&self) -> Option<u32> {
        self.compress_layers.then_some(self.compression_level)
    }

    /// Zoom minimum, maximum and step with NaN, non-positive and inverted values
    /// replaced by usable ones
    pub fn zoom_limits(&self) -> (f32, f32, f32) {
        let zoom_min = if self.zoom_min.is_nan() || self.zoom_min <= 0.0 {
            ZOOM_MIN
        } else {
            self.zoom_min
        };
        let zoom_max = if self.zoom_max.is_nan() || self.zoom_max < zoom_min {
            zoom_min.max(ZOOM_MAX)
        } else {
            self.zoom_max
        };
        let zoom_step = if self.zoom_step.is_nan() || self.zoom_step <= 0.0 {
            ZOOM_STEP
        } else {
            self.zoom_step
        };
        (zoom_min, zoom_max, zoom_step)
    }

    /// Repair values that would break the camera or the layer codec
    pub fn sanitized(mut self) -> Self {
        (self.zoom_min, self.zoom_max, self.zoom_step) = self.zoom_limits();
        if self.default_tile_size == 0 {
            self.default_tile_size = DEFAULT_TILE_SIZE;
        }
        self.compression_level = self.compression_level.min(9);
        self
    }
}
