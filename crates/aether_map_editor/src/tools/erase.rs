use aether_map_core::EMPTY_TILE;

use super::{PointerButton, StrokeState, Tool, ToolContext};

/// Clears cells back to the empty tile, continuing along a drag
#[derive(Debug, Default)]
pub struct EraseTool {
    stroke: StrokeState,
}

impl EraseTool {
    fn erase(ctx: &mut ToolContext<'_>, x: i32, y: i32) {
        if ctx.write_cell(x, y, EMPTY_TILE) {
            tracing::trace!("Erased ({x}, {y})");
        }
    }
}

impl Tool for EraseTool {
    fn on_pointer_down(&mut self, ctx: &mut ToolContext<'_>, x: i32, y: i32, button: PointerButton) {
        if button == PointerButton::Primary {
            Self::erase(ctx, x, y);
            self.stroke = StrokeState::Active { last: (x, y) };
        }
    }

    fn on_pointer_move(&mut self, ctx: &mut ToolContext<'_>, x: i32, y: i32) {
        match self.stroke {
            StrokeState::Active { last } if last != (x, y) => {
                Self::erase(ctx, x, y);
                self.stroke = StrokeState::Active { last: (x, y) };
            }
            _ => {}
        }
    }

    fn on_pointer_up(&mut self, _ctx: &mut ToolContext<'_>, _x: i32, _y: i32, _button: PointerButton) {
        self.stroke = StrokeState::Idle;
    }

    fn cursor(&self) -> &'static str {
        "eraser"
    }

    fn reset(&mut self) {
        self.stroke = StrokeState::Idle;
    }
}
