use super::{PointerButton, StrokeState, Tool, ToolContext};

/// Paints the selected tile, continuing along a drag
#[derive(Debug, Default)]
pub struct PaintTool {
    stroke: StrokeState,
}

impl PaintTool {
    fn paint(ctx: &mut ToolContext<'_>, x: i32, y: i32) {
        let Some(tile) = ctx.state.selected_tile() else {
            return;
        };
        if ctx.write_cell(x, y, tile) {
            tracing::trace!("Painted tile {tile} at ({x}, {y})");
        }
    }

    pub fn stroke(&self) -> StrokeState {
        self.stroke
    }
}

impl Tool for PaintTool {
    fn on_pointer_down(&mut self, ctx: &mut ToolContext<'_>, x: i32, y: i32, button: PointerButton) {
        if button != PointerButton::Primary {
            return;
        }
        Self::paint(ctx, x, y);
        self.stroke = StrokeState::Active { last: (x, y) };
    }

    fn on_pointer_move(&mut self, ctx: &mut ToolContext<'_>, x: i32, y: i32) {
        let StrokeState::Active { last } = self.stroke else {
            return;
        };
        if last != (x, y) {
            Self::paint(ctx, x, y);
            self.stroke = StrokeState::Active { last: (x, y) };
        }
    }

    fn on_pointer_up(&mut self, _ctx: &mut ToolContext<'_>, _x: i32, _y: i32, _button: PointerButton) {
        self.stroke = StrokeState::Idle;
    }

    fn cursor(&self) -> &'static str {
        "pencil"
    }

    fn reset(&mut self) {
        self.stroke = StrokeState::Idle;
    }
}
