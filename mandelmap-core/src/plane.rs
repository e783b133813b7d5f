use serde::{Deserialize, Serialize};

/// Unbounded tile coordinate in the plane, or a wrapped index into the grid.
pub type TileCoord = i32;

/// Visible rectangle in plane units.
///
/// `(x, y)` is the top-left corner. Plane y grows upward, so the rectangle
/// spans `[x, x + width]` horizontally and `[y - height, y]` vertically.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaneRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PlaneRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Plane x of the right edge.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Plane y of the bottom edge.
    pub fn bottom(&self) -> f64 {
        self.y - self.height
    }
}

/// The block of tiles currently covering a [`PlaneRect`].
///
/// `anchor_x`/`anchor_y` are the plane coordinates of the top-left tile's
/// origin; `u`/`v` are that tile's wrapped grid indices. `width`/`height`
/// count tiles and are never wrapped, so `u + width` may run past the grid
/// edge and continue at index 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BufferWindow {
    pub anchor_x: f64,
    pub anchor_y: f64,
    pub u: TileCoord,
    pub v: TileCoord,
    pub width: TileCoord,
    pub height: TileCoord,
}

impl BufferWindow {
    /// Whether the unwrapped tile coordinate `(u, v)` lies inside this window.
    pub fn contains(&self, u: TileCoord, v: TileCoord) -> bool {
        u >= self.u && u < self.u + self.width && v >= self.v && v < self.v + self.height
    }

    /// Every unwrapped tile coordinate in the window, row by row.
    pub fn tiles(&self) -> impl Iterator<Item = (TileCoord, TileCoord)> {
        let (u0, width) = (self.u, self.width.max(0));
        (self.v..self.v + self.height.max(0))
            .flat_map(move |v| (u0..u0 + width).map(move |u| (u, v)))
    }

    /// Number of tiles the window covers.
    pub fn tile_count(&self) -> usize {
        self.width.max(0) as usize * self.height.max(0) as usize
    }
}
