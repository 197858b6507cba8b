use std::collections::VecDeque;

use aether_map_core::{Layer, TileId};

use super::{PointerButton, Tool, ToolContext};

/// 4-connected breadth-first flood fill starting at `(x, y)`.
///
/// Replaces the connected region of cells holding the start cell's value with
/// `replacement` and returns the number of cells written. The layer lock is not
/// checked here.
pub fn flood_fill(layer: &mut Layer, x: i32, y: i32, replacement: TileId) -> usize {
    if !layer.in_bounds(x, y) {
        return 0;
    }
    let target = layer.get_tile(x, y);
    if target == replacement {
        return 0;
    }

    let width = layer.width() as usize;
    let mut visited = vec![false; width * layer.height() as usize];
    let mut queue = VecDeque::from([(x, y)]);
    let mut filled = 0;

    while let Some((cx, cy)) = queue.pop_front() {
        if !layer.in_bounds(cx, cy) {
            continue;
        }
        let idx = cy as usize * width + cx as usize;
        if visited[idx] || layer.get_tile(cx, cy) != target {
            continue;
        }
        visited[idx] = true;
        layer.set_tile(cx, cy, replacement);
        filled += 1;

        queue.extend([(cx + 1, cy), (cx - 1, cy), (cx, cy + 1), (cx, cy - 1)]);
    }
    filled
}

/// Single-click flood fill with the selected tile
#[derive(Debug, Default)]
pub struct FillTool;

impl Tool for FillTool {
    fn on_pointer_down(&mut self, ctx: &mut ToolContext<'_>, x: i32, y: i32, button: PointerButton) {
        if button != PointerButton::Primary {
            return;
        }
        let Some(tile) = ctx.state.selected_tile() else {
            return;
        };
        let Some(layer) = ctx.editable_layer(x, y) else {
            return;
        };

        let filled = flood_fill(layer, x, y, tile);
        if filled > 0 {
            tracing::debug!("Flood filled {filled} cells with tile {tile} from ({x}, {y})");
            ctx.project.mark_dirty();
        }
    }

    fn on_pointer_move(&mut self, _ctx: &mut ToolContext<'_>, _x: i32, _y: i32) {}

    fn on_pointer_up(&mut self, _ctx: &mut ToolContext<'_>, _x: i32, _y: i32, _button: PointerButton) {}

    fn cursor(&self) -> &'static str {
        "bucket"
    }
}
