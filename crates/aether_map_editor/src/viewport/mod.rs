//! Camera transforms and viewport culling

mod render;

pub use render::{RenderStats, TileRenderer};

use crate::config::{EditorConfig, ZOOM_MAX, ZOOM_MIN, ZOOM_STEP};

/// Half-open range of grid cells that intersect the viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisibleRange {
    pub start_x: u32,
    pub end_x: u32,
    pub start_y: u32,
    pub end_y: u32,
}

impl VisibleRange {
    pub fn is_empty(&self) -> bool {
        self.start_x >= self.end_x || self.start_y >= self.end_y
    }

    pub fn cell_count(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        (self.end_x - self.start_x) as usize * (self.end_y - self.start_y) as usize
    }
}

/// View onto the map in pixel space.
///
/// `(x, y)` is the top-left of the visible window and never goes negative. The
/// camera may pan past the far edges of the map.
#[cfg_attr(feature = "bevy", derive(bevy::prelude::Resource))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    x: f32,
    y: f32,
    zoom: f32,
    zoom_min: f32,
    zoom_max: f32,
    zoom_step: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
            zoom_min: ZOOM_MIN,
            zoom_max: ZOOM_MAX,
            zoom_step: ZOOM_STEP,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Camera using the zoom bounds and step from `config`
    pub fn from_config(config: &EditorConfig) -> Self {
        let (zoom_min, zoom_max, zoom_step) = config.zoom_limits();
        let mut camera = Self {
            zoom_min,
            zoom_max,
            zoom_step,
            ..Self::default()
        };
        camera.set_zoom(1.0);
        camera
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Clamp and store a zoom factor. NaN is ignored.
    pub fn set_zoom(&mut self, zoom: f32) {
        if zoom.is_nan() {
            return;
        }
        self.zoom = zoom.clamp(self.zoom_min, self.zoom_max);
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + self.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - self.zoom_step);
    }

    /// Move the camera, stopping at the top and left edges
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.set_position(self.x + dx, self.y + dy);
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.x = if x.is_nan() { 0.0 } else { x.max(0.0) };
        self.y = if y.is_nan() { 0.0 } else { y.max(0.0) };
    }

    /// Tile size on screen, rounded down
    pub fn scaled_tile_size(&self, tile_width: u32, tile_height: u32) -> (u32, u32) {
        (
            (tile_width as f32 * self.zoom).floor() as u32,
            (tile_height as f32 * self.zoom).floor() as u32,
        )
    }

    /// Grid cell under a screen position. Positions left of or above the map give
    /// negative cells.
    pub fn screen_to_grid(
        &self,
        screen_x: f32,
        screen_y: f32,
        tile_width: u32,
        tile_height: u32,
    ) -> (i32, i32) {
        let gx = ((screen_x + self.x) / (tile_width as f32 * self.zoom)).floor();
        let gy = ((screen_y + self.y) / (tile_height as f32 * self.zoom)).floor();
        (gx as i32, gy as i32)
    }

    /// Screen position of a cell's top-left corner; the inverse of [`Camera::screen_to_grid`]
    pub fn grid_to_screen(&self, x: i32, y: i32, tile_width: u32, tile_height: u32) -> (i64, i64) {
        let (sw, sh) = self.scaled_tile_size(tile_width, tile_height);
        (
            x as i64 * sw as i64 - self.x.floor() as i64,
            y as i64 * sh as i64 - self.y.floor() as i64,
        )
    }

    /// Cells of a `grid_width x grid_height` layer that fall inside a
    /// `screen_width x screen_height` viewport, with two cells of overscan.
    pub fn visible_range(
        &self,
        tile_width: u32,
        tile_height: u32,
        grid_width: u32,
        grid_height: u32,
        screen_width: u32,
        screen_height: u32,
    ) -> VisibleRange {
        let (sw, sh) = self.scaled_tile_size(tile_width, tile_height);
        if sw == 0 || sh == 0 {
            return VisibleRange::default();
        }
        let axis = |camera: f32, scaled: u32, screen: u32, cells: u32| {
            let start = (camera / scaled as f32).floor().max(0.0) as u32;
            let end = ((camera + screen as f32) / scaled as f32).floor() as u32 + 2;
            (start, end.min(cells))
        };
        let (start_x, end_x) = axis(self.x, sw, screen_width, grid_width);
        let (start_y, end_y) = axis(self.y, sh, screen_height, grid_height);
        VisibleRange {
            start_x,
            end_x,
            start_y,
            end_y,
        }
    }
}
