//! Pointer-driven editing tools and the controller that dispatches events to them

mod erase;
mod fill;
mod paint;
mod picker;

use std::fmt;
use std::str::FromStr;

use aether_map_core::{Layer, Project, TileId};
use serde::{Deserialize, Serialize};

use crate::editor_state::EditorState;

pub use erase::EraseTool;
pub use fill::{flood_fill, FillTool};
pub use paint::PaintTool;
pub use picker::PickerTool;

/// Which pointer button produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

impl PointerButton {
    /// Map a conventional mouse button number (1 = left, 2 = middle, 3 = right)
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Primary),
            2 => Some(Self::Middle),
            3 => Some(Self::Secondary),
            _ => None,
        }
    }
}

/// Available editing tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Paint,
    Erase,
    Fill,
    Picker,
}

impl ToolKind {
    pub const ALL: [ToolKind; 4] = [
        ToolKind::Paint,
        ToolKind::Erase,
        ToolKind::Fill,
        ToolKind::Picker,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Paint => "paint",
            ToolKind::Erase => "erase",
            ToolKind::Fill => "fill",
            ToolKind::Picker => "picker",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ToolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown tool '{s}'"))
    }
}

/// Everything a tool may read or mutate while handling an event
pub struct ToolContext<'a> {
    pub project: &'a mut Project,
    pub state: &'a mut EditorState,
}

impl<'a> ToolContext<'a> {
    pub fn new(project: &'a mut Project, state: &'a mut EditorState) -> Self {
        Self { project, state }
    }

    /// The active layer if it exists, is unlocked and contains `(x, y)`
    fn editable_layer(&mut self, x: i32, y: i32) -> Option<&mut Layer> {
        let layer = self.state.active_layer_mut(self.project)?;
        if layer.locked || !layer.in_bounds(x, y) {
            return None;
        }
        Some(layer)
    }

    /// Write one cell, re-checking lock and bounds first. Returns true if the cell changed.
    fn write_cell(&mut self, x: i32, y: i32, id: TileId) -> bool {
        let Some(layer) = self.editable_layer(x, y) else {
            return false;
        };
        if layer.get_tile(x, y) == id {
            return false;
        }
        layer.set_tile(x, y, id);
        self.project.mark_dirty();
        true
    }
}

/// A tool reacting to pointer events in grid coordinates
pub trait Tool {
    fn on_pointer_down(&mut self, ctx: &mut ToolContext<'_>, x: i32, y: i32, button: PointerButton);

    fn on_pointer_move(&mut self, ctx: &mut ToolContext<'_>, x: i32, y: i32);

    fn on_pointer_up(&mut self, ctx: &mut ToolContext<'_>, x: i32, y: i32, button: PointerButton);

    fn cursor(&self) -> &'static str;

    /// Drop any in-progress stroke
    fn reset(&mut self) {}
}

/// Stroke state shared by the drag tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrokeState {
    #[default]
    Idle,
    Active {
        last: (i32, i32),
    },
}

/// Owns one instance of every tool and forwards pointer events to the active one
#[cfg_attr(feature = "bevy", derive(bevy::prelude::Resource))]
#[derive(Debug, Default)]
pub struct ToolController {
    active: ToolKind,
    paint: PaintTool,
    erase: EraseTool,
    fill: FillTool,
    picker: PickerTool,
}

impl ToolController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_tool(&self) -> ToolKind {
        self.active
    }

    pub fn cursor(&self) -> &'static str {
        self.tool(self.active).cursor()
    }

    /// Switch tools and mirror the choice into the editor state
    pub fn set_active_tool(&mut self, kind: ToolKind, state: &mut EditorState) {
        if kind != self.active {
            self.tool_mut(self.active).reset();
            tracing::debug!("Switched tool {} -> {}", self.active, kind);
        }
        self.active = kind;
        state.set_tool(kind);
    }

    /// Switch tools by name; unknown names are ignored
    pub fn set_active_tool_by_name(&mut self, name: &str, state: &mut EditorState) -> bool {
        match name.parse::<ToolKind>() {
            Ok(kind) => {
                self.set_active_tool(kind, state);
                true
            }
            Err(err) => {
                tracing::warn!("{err}");
                false
            }
        }
    }

    fn tool(&self, kind: ToolKind) -> &dyn Tool {
        match kind {
            ToolKind::Paint => &self.paint,
            ToolKind::Erase => &self.erase,
            ToolKind::Fill => &self.fill,
            ToolKind::Picker => &self.picker,
        }
    }

    fn tool_mut(&mut self, kind: ToolKind) -> &mut dyn Tool {
        match kind {
            ToolKind::Paint => &mut self.paint,
            ToolKind::Erase => &mut self.erase,
            ToolKind::Fill => &mut self.fill,
            ToolKind::Picker => &mut self.picker,
        }
    }

    pub fn pointer_down(
        &mut self,
        project: &mut Project,
        state: &mut EditorState,
        x: i32,
        y: i32,
        button: PointerButton,
    ) {
        // Pick up a tool change made directly on the state
        if state.active_tool() != self.active {
            self.set_active_tool(state.active_tool(), state);
        }
        let mut ctx = ToolContext::new(project, state);
        self.tool_mut(self.active)
            .on_pointer_down(&mut ctx, x, y, button);
    }

    pub fn pointer_move(&mut self, project: &mut Project, state: &mut EditorState, x: i32, y: i32) {
        state.pointer_cell = (x, y);
        let mut ctx = ToolContext::new(project, state);
        self.tool_mut(self.active).on_pointer_move(&mut ctx, x, y);
    }

    pub fn pointer_up(
        &mut self,
        project: &mut Project,
        state: &mut EditorState,
        x: i32,
        y: i32,
        button: PointerButton,
    ) {
        let mut ctx = ToolContext::new(project, state);
        self.tool_mut(self.active)
            .on_pointer_up(&mut ctx, x, y, button);
    }
}
