use std::collections::HashMap;

use aether_map_core::{Layer, Project, TileId, Tileset, EMPTY_TILE};
use image::imageops::{self, FilterType};
use image::{GenericImageView, Rgba, RgbaImage};

use super::{Camera, VisibleRange};
use crate::config::EditorConfig;
use crate::editor_state::EditorState;

/// What one render pass did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    pub layers_drawn: usize,
    pub tiles_drawn: usize,
    /// Non-empty cells whose tile had no surface in the tileset
    pub tiles_missing: usize,
    pub grid_lines: usize,
    pub highlight_drawn: bool,
}

/// Composites project layers onto an RGBA surface
#[derive(Debug, Clone)]
pub struct TileRenderer {
    background: Rgba<u8>,
    grid_color: Rgba<u8>,
    highlight_color: Rgba<u8>,
    highlight_thickness: u32,
    min_grid_cell_px: u32,
}

impl Default for TileRenderer {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl TileRenderer {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            background: Rgba(config.background_color),
            grid_color: Rgba(config.grid_color),
            highlight_color: Rgba(config.highlight_color),
            highlight_thickness: config.highlight_thickness,
            min_grid_cell_px: config.min_grid_cell_px,
        }
    }

    /// Draw one frame of the viewport into `target`, whose size is the viewport size
    pub fn render(
        &self,
        target: &mut RgbaImage,
        project: &Project,
        state: &EditorState,
        camera: &Camera,
    ) -> RenderStats {
        let mut stats = RenderStats::default();
        let (screen_w, screen_h) = target.dimensions();
        fill(target, self.background);

        let (sw, sh) = camera.scaled_tile_size(project.tile_width, project.tile_height);
        if sw == 0 || sh == 0 {
            return stats;
        }
        let range = camera.visible_range(
            project.tile_width,
            project.tile_height,
            project.grid_width(),
            project.grid_height(),
            screen_w,
            screen_h,
        );
        let origin = (camera.x().floor() as i64, camera.y().floor() as i64);

        for layer in project.layers_in_draw_order() {
            if !layer.visible {
                continue;
            }
            stats.layers_drawn += 1;
            draw_layer(target, layer, project.tileset.as_ref(), range, (sw, sh), origin, &mut stats);
        }

        if state.show_grid && sw >= self.min_grid_cell_px && sh >= self.min_grid_cell_px {
            stats.grid_lines = self.draw_grid(target, range, (sw, sh), origin);
        }

        let active_visible = state
            .active_layer_id()
            .and_then(|id| project.layer(id))
            .is_some_and(|layer| layer.visible);
        if active_visible {
            let (px, py) = state.pointer_cell;
            let (x, y) = camera.grid_to_screen(px, py, project.tile_width, project.tile_height);
            self.draw_outline(target, x, y, sw, sh);
            stats.highlight_drawn = true;
        }

        stats
    }

    /// Composite the whole map at zoom 1 with no grid or highlight.
    ///
    /// The result is `grid_width * tile_width` by `grid_height * tile_height` pixels on a
    /// transparent background.
    pub fn render_full_map(&self, project: &Project) -> RgbaImage {
        let width = project.grid_width() * project.tile_width;
        let height = project.grid_height() * project.tile_height;
        let mut target = RgbaImage::new(width, height);

        let range = VisibleRange {
            start_x: 0,
            end_x: project.grid_width(),
            start_y: 0,
            end_y: project.grid_height(),
        };
        let mut stats = RenderStats::default();
        for layer in project.layers_in_draw_order() {
            if layer.visible {
                draw_layer(
                    &mut target,
                    layer,
                    project.tileset.as_ref(),
                    range,
                    (project.tile_width, project.tile_height),
                    (0, 0),
                    &mut stats,
                );
            }
        }
        tracing::debug!(
            "Rendered {}x{} map image ({} tiles, {} missing)",
            width,
            height,
            stats.tiles_drawn,
            stats.tiles_missing
        );
        target
    }

    /// Lines on every tile boundary inside `range` that fall on screen
    fn draw_grid(
        &self,
        target: &mut RgbaImage,
        range: VisibleRange,
        (sw, sh): (u32, u32),
        (ox, oy): (i64, i64),
    ) -> usize {
        if range.is_empty() {
            return 0;
        }
        let (screen_w, screen_h) = (target.width() as i64, target.height() as i64);
        let top = range.start_y as i64 * sh as i64 - oy;
        let bottom = range.end_y as i64 * sh as i64 - oy;
        let left = range.start_x as i64 * sw as i64 - ox;
        let right = range.end_x as i64 * sw as i64 - ox;
        let mut lines = 0;

        for gx in range.start_x..=range.end_x {
            let x = gx as i64 * sw as i64 - ox;
            if (0..=screen_w).contains(&x) {
                fill_rect(target, x, top, 1, bottom - top, self.grid_color);
                lines += 1;
            }
        }
        for gy in range.start_y..=range.end_y {
            let y = gy as i64 * sh as i64 - oy;
            if (0..=screen_h).contains(&y) {
                fill_rect(target, left, y, right - left, 1, self.grid_color);
                lines += 1;
            }
        }
        lines
    }

    fn draw_outline(&self, target: &mut RgbaImage, x: i64, y: i64, w: u32, h: u32) {
        let (w, h) = (w as i64, h as i64);
        let t = (self.highlight_thickness as i64).clamp(1, w.min(h).max(1));
        let color = self.highlight_color;
        fill_rect(target, x, y, w, t, color);
        fill_rect(target, x, y + h - t, w, t, color);
        fill_rect(target, x, y, t, h, color);
        fill_rect(target, x + w - t, y, t, h, color);
    }
}

fn draw_layer(
    target: &mut RgbaImage,
    layer: &Layer,
    tileset: Option<&Tileset>,
    range: VisibleRange,
    (sw, sh): (u32, u32),
    (ox, oy): (i64, i64),
    stats: &mut RenderStats,
) {
    let opacity = layer.opacity();
    // Scaled, opacity-adjusted copies of each tile used by this layer
    let mut cache: HashMap<TileId, Option<RgbaImage>> = HashMap::new();

    for y in range.start_y..range.end_y {
        for x in range.start_x..range.end_x {
            let id = layer.get_tile(x as i32, y as i32);
            if id == EMPTY_TILE {
                continue;
            }
            let sprite = cache
                .entry(id)
                .or_insert_with(|| prepare_tile(tileset, id, sw, sh, opacity));
            let Some(sprite) = sprite.as_ref() else {
                stats.tiles_missing += 1;
                continue;
            };
            let px = x as i64 * sw as i64 - ox;
            let py = y as i64 * sh as i64 - oy;
            imageops::overlay(target, sprite, px, py);
            stats.tiles_drawn += 1;
        }
    }
}

fn prepare_tile(tileset: Option<&Tileset>, id: TileId, sw: u32, sh: u32, opacity: f32) -> Option<RgbaImage> {
    let Some(surface) = tileset.and_then(|t| t.tile_surface(id)) else {
        tracing::debug!("No surface for tile {id}, skipping");
        return None;
    };
    let mut sprite = if surface.width() != sw || surface.height() != sh {
        imageops::resize(&*surface, sw, sh, FilterType::Nearest)
    } else {
        surface.to_image()
    };
    if opacity < 1.0 {
        for pixel in sprite.pixels_mut() {
            pixel[3] = (pixel[3] as f32 * opacity).round() as u8;
        }
    }
    Some(sprite)
}

fn fill(target: &mut RgbaImage, color: Rgba<u8>) {
    for pixel in target.pixels_mut() {
        *pixel = color;
    }
}

/// Fill a rectangle, clipped to the target
fn fill_rect(target: &mut RgbaImage, x: i64, y: i64, w: i64, h: i64, color: Rgba<u8>) {
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + w).min(target.width() as i64);
    let y1 = (y + h).min(target.height() as i64);
    for py in y0..y1 {
        for px in x0..x1 {
            target.put_pixel(px as u32, py as u32, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aether_map_core::LayerKind;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    /// 16x8 image holding two 8x8 tiles: 1 = red, 2 = blue
    fn two_tile_tileset() -> Tileset {
        let image = RgbaImage::from_fn(16, 8, |x, _| if x < 8 { RED } else { BLUE });
        let mut tileset = Tileset::new("test", "test.png").with_tile_size(8, 8);
        tileset.set_image(image);
        tileset.slice_from_image();
        tileset
    }

    fn project() -> Project {
        let mut project = Project::new("Render", 4, 4, 8, 8);
        project.add_layer("Ground", LayerKind::Actual).unwrap();
        project.set_tileset(two_tile_tileset());
        project
    }

    fn no_overlay() -> EditorState {
        let mut state = EditorState::default();
        state.show_grid = false;
        state
    }

    #[test]
    fn test_empty_project_draws_background() {
        let project = Project::new("Empty", 4, 4, 8, 8);
        let mut target = RgbaImage::new(32, 32);
        let stats = TileRenderer::default().render(&mut target, &project, &no_overlay(), &Camera::new());

        assert_eq!(stats.tiles_drawn, 0);
        assert_eq!(*target.get_pixel(10, 10), Rgba([40, 40, 40, 255]));
    }

    #[test]
    fn test_tiles_are_placed_and_scaled() {
        let mut project = project();
        let id = project.layers()[0].id();
        project.layer_mut(id).unwrap().set_tile(1, 0, 2);

        let mut camera = Camera::new();
        camera.set_zoom(2.0);
        let mut target = RgbaImage::new(64, 64);
        let stats = TileRenderer::default().render(&mut target, &project, &no_overlay(), &camera);

        assert_eq!(stats.tiles_drawn, 1);
        // Cell (1, 0) spans x 16..32 at zoom 2
        assert_eq!(*target.get_pixel(16, 0), BLUE);
        assert_eq!(*target.get_pixel(31, 15), BLUE);
        assert_eq!(*target.get_pixel(15, 0), Rgba([40, 40, 40, 255]));
        assert_eq!(*target.get_pixel(32, 0), Rgba([40, 40, 40, 255]));
    }

    #[test]
    fn test_layers_draw_in_z_order_and_hidden_skipped() {
        let mut project = project();
        let bottom = project.layers()[0].id();
        let top = project.add_layer("Top", LayerKind::Foreground).unwrap();
        project.layer_mut(bottom).unwrap().set_tile(0, 0, 1);
        project.layer_mut(top).unwrap().set_tile(0, 0, 2);

        let renderer = TileRenderer::default();
        let mut target = RgbaImage::new(32, 32);
        renderer.render(&mut target, &project, &no_overlay(), &Camera::new());
        assert_eq!(*target.get_pixel(0, 0), BLUE);

        project.layer_mut(top).unwrap().visible = false;
        let stats = renderer.render(&mut target, &project, &no_overlay(), &Camera::new());
        assert_eq!(*target.get_pixel(0, 0), RED);
        assert_eq!(stats.layers_drawn, 1);
    }

    #[test]
    fn test_missing_surface_is_skipped() {
        let mut project = project();
        let id = project.layers()[0].id();
        project.layer_mut(id).unwrap().set_tile(0, 0, 99);
        project.layer_mut(id).unwrap().set_tile(1, 0, 1);

        let mut target = RgbaImage::new(32, 32);
        let stats = TileRenderer::default().render(&mut target, &project, &no_overlay(), &Camera::new());
        assert_eq!(stats.tiles_missing, 1);
        assert_eq!(stats.tiles_drawn, 1);
        assert_eq!(*target.get_pixel(8, 0), RED);
    }

    #[test]
    fn test_opacity_blends_with_background() {
        let mut project = project();
        let id = project.layers()[0].id();
        {
            let layer = project.layer_mut(id).unwrap();
            layer.set_tile(0, 0, 1);
            layer.set_opacity(0.5);
        }

        let mut target = RgbaImage::new(32, 32);
        TileRenderer::default().render(&mut target, &project, &no_overlay(), &Camera::new());
        let pixel = target.get_pixel(4, 4);
        assert!(pixel[0] > 40 && pixel[0] < 255, "{pixel:?}");
    }

    #[test]
    fn test_grid_suppressed_when_dense() {
        let project = project();
        let state = EditorState::default();
        let renderer = TileRenderer::default();
        let mut target = RgbaImage::new(32, 32);

        let stats = renderer.render(&mut target, &project, &state, &Camera::new());
        assert!(stats.grid_lines > 0);
        assert_eq!(*target.get_pixel(8, 3), Rgba([100, 100, 100, 255]));

        // 8 px * 0.25 = 2 px per cell, below the 4 px minimum
        let mut camera = Camera::new();
        camera.set_zoom(0.25);
        let stats = renderer.render(&mut target, &project, &state, &camera);
        assert_eq!(stats.grid_lines, 0);
    }

    #[test]
    fn test_highlight_follows_pointer_on_visible_active_layer() {
        let mut project = project();
        let id = project.layers()[0].id();
        let mut state = no_overlay();
        state.set_active_layer(&project, id);
        state.pointer_cell = (1, 1);

        let renderer = TileRenderer::default();
        let mut target = RgbaImage::new(32, 32);
        let stats = renderer.render(&mut target, &project, &state, &Camera::new());
        assert!(stats.highlight_drawn);
        assert_eq!(*target.get_pixel(8, 8), Rgba([255, 255, 0, 255]));
        assert_eq!(*target.get_pixel(12, 12), Rgba([40, 40, 40, 255]));

        project.layer_mut(id).unwrap().visible = false;
        let stats = renderer.render(&mut target, &project, &state, &Camera::new());
        assert!(!stats.highlight_drawn);
    }

    #[test]
    fn test_full_map_render() {
        let mut project = project();
        let id = project.layers()[0].id();
        project.layer_mut(id).unwrap().set_tile(3, 3, 2);

        let image = TileRenderer::default().render_full_map(&project);
        assert_eq!(image.dimensions(), (32, 32));
        assert_eq!(*image.get_pixel(24, 24), BLUE);
        assert_eq!(image.get_pixel(0, 0)[3], 0);
    }
}
