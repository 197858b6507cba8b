//! Core data structures for aether_map_editor
//!
//! This crate provides the fundamental types for representing tile maps:
//! - `TileGrid` - A dense grid of tile IDs with permissive bounds handling
//! - `Tileset` - A spritesheet sliced into `TileDefinition`s
//! - `Layer` - A named grid with visibility, lock, opacity and stacking order
//! - `Project` - Ordered layers plus one tileset and the grid dimensions

mod error;
mod grid;
mod layer;
mod project;
mod tileset;

pub use error::{LayerError, TilesetError};
pub use grid::{TileGrid, TileId, EMPTY_TILE};
pub use layer::{Layer, LayerId, LayerKind};
pub use project::Project;
pub use tileset::{
    detect_tile_size, TileDefinition, TileRect, Tileset, FALLBACK_TILE_SIZE,
    TILE_SIZE_CANDIDATES,
};
