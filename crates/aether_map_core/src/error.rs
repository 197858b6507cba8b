//! Error types for the core data model

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or slicing a tileset image
#[derive(Debug, Error)]
pub enum TilesetError {
    #[error("Tileset image not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to decode tileset image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Tileset image is not loaded")]
    NotLoaded,
    #[error("Invalid tile size {width}x{height}")]
    InvalidTileSize { width: u32, height: u32 },
    #[error("Tile {id} source rect lies outside the tileset image")]
    RectOutOfBounds { id: u32 },
}

/// Errors raised when adding layers to a project
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayerError {
    #[error("Layer name must not be empty")]
    EmptyName,
    #[error("A layer named '{0}' already exists")]
    DuplicateName(String),
    #[error("Layer is {found_width}x{found_height} but the project grid is {expected_width}x{expected_height}")]
    SizeMismatch {
        expected_width: u32,
        expected_height: u32,
        found_width: u32,
        found_height: u32,
    },
}
