//! Dense, fixed-size grid of tile IDs

use serde::{Deserialize, Serialize};

/// Tile identifier. `0` is reserved for "no tile".
pub type TileId = u32;

/// The reserved empty tile ID
pub const EMPTY_TILE: TileId = 0;

/// A fixed `width x height` row-major array of tile IDs.
///
/// Reads outside the grid return [`EMPTY_TILE`] and writes outside the grid are
/// ignored, so callers can pass raw pointer coordinates without checking them first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGrid {
    width: u32,
    height: u32,
    cells: Vec<TileId>,
}

impl TileGrid {
    /// Create a grid with every cell set to [`EMPTY_TILE`]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![EMPTY_TILE; (width as usize) * (height as usize)],
        }
    }

    /// Build a grid from row-major cell data.
    ///
    /// Returns `None` if `cells.len() != width * height`.
    pub fn from_cells(width: u32, height: u32, cells: Vec<TileId>) -> Option<Self> {
        if cells.len() != (width as usize) * (height as usize) {
            return None;
        }
        Some(Self {
            width,
            height,
            cells,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Check whether `(x, y)` lies inside the grid
    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if self.in_bounds(x, y) {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Get the tile at `(x, y)`, or [`EMPTY_TILE`] when out of range
    pub fn get(&self, x: i32, y: i32) -> TileId {
        self.index(x, y)
            .map(|idx| self.cells[idx])
            .unwrap_or(EMPTY_TILE)
    }

    /// Set the tile at `(x, y)`. Out-of-range writes are ignored.
    pub fn set(&mut self, x: i32, y: i32, id: TileId) {
        if let Some(idx) = self.index(x, y) {
            self.cells[idx] = id;
        }
    }

    /// Reset every cell to [`EMPTY_TILE`]
    pub fn clear(&mut self) {
        self.cells.fill(EMPTY_TILE);
    }

    /// Row-major view of all cells
    pub fn cells(&self) -> &[TileId] {
        &self.cells
    }

    /// True if no cell holds a tile
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|&id| id == EMPTY_TILE)
    }

    /// Number of non-empty cells
    pub fn painted_count(&self) -> usize {
        self.cells.iter().filter(|&&id| id != EMPTY_TILE).count()
    }
}
