//! Escape-count colouring.
//!
//! Points that never escape get [`BOUNDED_COLOR`]. Escaped points cycle
//! through [`COLOR_COUNT`] colours: 16 bands of 16 steps, each band a linear
//! blend between consecutive anchors of [`UNBOUNDED_COLORS`].

use crate::Iteration;

/// Linear RGB colour with components in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Components scaled to bytes, truncating.
    pub fn to_rgb8(self) -> [u8; 3] {
        [
            (self.r * 255.0) as u8,
            (self.g * 255.0) as u8,
            (self.b * 255.0) as u8,
        ]
    }
}

pub const PALETTE_SIZE: usize = 16;
pub const INTERVAL: usize = 16;
pub const COLOR_COUNT: usize = INTERVAL * PALETTE_SIZE;

pub const BOUNDED_COLOR: Color = Color::new(0.0, 0.0, 0.0);

const BLACK: Color = Color::new(0.0, 0.0, 0.0);

/// Band anchors. The last entry repeats the first so the cycle is seamless.
pub const UNBOUNDED_COLORS: [Color; PALETTE_SIZE + 1] = [
    Color::new(0.0, 0.0, 1.0),
    BLACK,
    Color::new(1.0, 0.0, 1.0),
    BLACK,
    Color::new(1.0, 0.0, 0.0),
    BLACK,
    Color::new(1.0, 0.5, 0.0),
    BLACK,
    Color::new(1.0, 1.0, 0.0),
    BLACK,
    Color::new(0.5, 1.0, 0.0),
    BLACK,
    Color::new(0.0, 1.0, 0.0),
    BLACK,
    Color::new(0.0, 1.0, 1.0),
    BLACK,
    Color::new(0.0, 0.0, 1.0),
];

/// Interpolated palette colour for `index` in `[0, COLOR_COUNT)`.
pub fn interpolated(index: usize) -> Color {
    let index = index % COLOR_COUNT;
    let band = index / INTERVAL;
    let t = (index % INTERVAL) as f32 / INTERVAL as f32;
    let from = UNBOUNDED_COLORS[band];
    let to = UNBOUNDED_COLORS[band + 1];

    Color::new(
        from.r + (to.r - from.r) * t,
        from.g + (to.g - from.g) * t,
        from.b + (to.b - from.b) * t,
    )
}

/// Byte colour for an iteration count under `threshold`.
pub fn color_for(iteration: Iteration, threshold: Iteration) -> [u8; 3] {
    if iteration >= threshold {
        BOUNDED_COLOR.to_rgb8()
    } else {
        interpolated(iteration as usize).to_rgb8()
    }
}
