//! aether_map_editor - Tile map editing on top of `aether_map_core`
//!
//! This crate provides everything a host GUI shell needs to edit a tile map:
//! - Paint, erase, flood fill and picker tools driven by pointer events
//! - Camera zoom/pan with viewport culling and an RGBA renderer
//! - Project save/load (binary layer files + JSON metadata)
//! - Single-file archive export/import and full-map image export
//! - TOML editor configuration
//!
//! # Usage
//!
//! ```rust,ignore
//! use aether_map_editor::{EditorConfig, EditorSession, PointerButton, ToolKind};
//!
//! let mut session = EditorSession::new(EditorConfig::default());
//! session.import_tileset("assets/dungeon.png".as_ref())?;
//! session.select_tile(3);
//! session.set_tool(ToolKind::Paint);
//! session.pointer_down(40.0, 40.0, PointerButton::Primary);
//! session.pointer_up(40.0, 40.0, PointerButton::Primary);
//! session.save_project("maps/dungeon".as_ref())?;
//! ```

pub mod config;
pub mod editor_state;
pub mod error;
pub mod project;
pub mod session;
pub mod tools;
pub mod viewport;

pub use aether_map_core;

pub use config::{DefaultLayer, EditorConfig};
pub use editor_state::EditorState;
pub use error::ProjectError;
pub use session::EditorSession;
pub use tools::{PointerButton, Tool, ToolContext, ToolController, ToolKind};
pub use viewport::{Camera, RenderStats, TileRenderer, VisibleRange};
