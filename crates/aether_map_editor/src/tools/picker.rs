use aether_map_core::EMPTY_TILE;

use super::{PointerButton, Tool, ToolContext};

/// Eyedropper: selects the tile under the pointer. Works on locked layers.
#[derive(Debug, Default)]
pub struct PickerTool;

impl Tool for PickerTool {
    fn on_pointer_down(&mut self, ctx: &mut ToolContext<'_>, x: i32, y: i32, button: PointerButton) {
        if button != PointerButton::Primary {
            return;
        }
        let picked = match ctx.state.active_layer(ctx.project) {
            Some(layer) if layer.in_bounds(x, y) => layer.get_tile(x, y),
            _ => return,
        };
        if picked != EMPTY_TILE {
            tracing::debug!("Picked tile {picked} at ({x}, {y})");
            ctx.state.select_tile(picked);
        }
    }

    fn on_pointer_move(&mut self, _ctx: &mut ToolContext<'_>, _x: i32, _y: i32) {}

    fn on_pointer_up(&mut self, _ctx: &mut ToolContext<'_>, _x: i32, _y: i32, _button: PointerButton) {}

    fn cursor(&self) -> &'static str {
        "crosshair"
    }
}
