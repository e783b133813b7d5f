use mandelmap_core::Iteration;

/// Per-texel escape-time kernel.
///
/// Implementations must be pure: the same point and threshold always give
/// the same count. Tiles call this from compute threads.
pub trait EscapeKernel: Send + Sync {
    /// Iteration count at plane point `(x, y)`, capped at `threshold`.
    fn iterations(&self, x: f64, y: f64, threshold: Iteration) -> Iteration;
}

/// Mandelbrot set using escape-time iteration with f64 arithmetic.
///
/// Iterates z = z^2 + c from z = 0 and reports how many iterations ran
/// before |z| exceeded 2, or `threshold` if it never did.
#[derive(Clone, Copy, Debug, Default)]
pub struct Mandelbrot;

impl EscapeKernel for Mandelbrot {
    fn iterations(&self, cx: f64, cy: f64, threshold: Iteration) -> Iteration {
        const ESCAPE_RADIUS_SQ: f64 = 4.0;

        let mut zx = 0.0_f64;
        let mut zy = 0.0_f64;

        for i in 0..threshold {
            // z = z^2 + c
            let new_zx = zx * zx - zy * zy + cx;
            let new_zy = 2.0 * zx * zy + cy;
            zx = new_zx;
            zy = new_zy;

            if zx * zx + zy * zy > ESCAPE_RADIUS_SQ {
                return i;
            }
        }

        threshold
    }
}

/// Test pattern that encodes plane position in the iteration count.
///
/// The point is snapped to the texel lattice (`x / texel_length`,
/// `-y / texel_length`), and the lattice indices modulo 64 are packed as
/// `column + 64 * row`. Any two texels less than 64 apart on both axes get
/// distinct counts, which lets tests check exactly where a texel landed.
#[derive(Clone, Copy, Debug)]
pub struct TestImage {
    texel_length: f64,
}

impl TestImage {
    const PERIOD: i64 = 64;

    pub fn new(texel_length: f64) -> Self {
        Self { texel_length }
    }

    /// Count for the texel at lattice position `(column, row)`.
    pub fn encode(column: i64, row: i64) -> Iteration {
        (column.rem_euclid(Self::PERIOD) + Self::PERIOD * row.rem_euclid(Self::PERIOD))
            as Iteration
    }
}

impl EscapeKernel for TestImage {
    fn iterations(&self, x: f64, y: f64, threshold: Iteration) -> Iteration {
        let column = (x / self.texel_length).round() as i64;
        let row = (-y / self.texel_length).round() as i64;
        Self::encode(column, row).min(threshold)
    }
}
