//! Error type shared by persistence and the host-facing session surface

use std::path::PathBuf;

use aether_map_core::{LayerError, TilesetError};
use thiserror::Error;

/// Failure reported back to the host shell by project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("Invalid file format: {0}")]
    Format(String),
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Failed to encode image: {0}")]
    Encode(String),
    #[error(transparent)]
    Tileset(#[from] TilesetError),
    #[error(transparent)]
    Layer(#[from] LayerError),
    #[error("Project has no tileset")]
    NoTileset,
    #[error("Layer '{layer}' still has painted tiles; clear it before subdividing the tileset")]
    TilesInUse { layer: String },
    #[error("No project location set; save with an explicit path first")]
    NoPath,
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl ProjectError {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        ProjectError::Format(msg.into())
    }
}
