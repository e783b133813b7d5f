//! Fixed-size block of escape counts.

use crate::EscapeKernel;
use mandelmap_core::{Iteration, Surface, TILE_SIZE};

/// `SIZE` x `SIZE` iteration counts for one square region of the plane.
///
/// Counts are stored row-major; texel `(u, v)` samples the plane at
/// `(origin_x + u * texel_length, origin_y - v * texel_length)`.
pub struct Tile<const SIZE: usize = TILE_SIZE> {
    iterations: Box<[Iteration]>,
}

impl<const SIZE: usize> Tile<SIZE> {
    /// Edge length in texels.
    pub const EDGE: usize = SIZE;

    pub fn new() -> Self {
        Self {
            iterations: vec![0; SIZE * SIZE].into_boxed_slice(),
        }
    }

    /// Fill every texel from `kernel`.
    ///
    /// Touches only this tile's storage, so it is safe on any thread that
    /// owns the tile.
    pub fn compute(
        &mut self,
        kernel: &dyn EscapeKernel,
        origin_x: f64,
        origin_y: f64,
        texel_length: f64,
        threshold: Iteration,
    ) {
        for (v, row) in self.iterations.chunks_exact_mut(SIZE).enumerate() {
            let y = origin_y - v as f64 * texel_length;
            for (u, texel) in row.iter_mut().enumerate() {
                let x = origin_x + u as f64 * texel_length;
                *texel = kernel.iterations(x, y, threshold);
            }
        }
    }

    /// Colour every texel into `surface` at the block for grid cell
    /// `(grid_u, grid_v)`.
    pub fn draw<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        grid_u: u32,
        grid_v: u32,
        threshold: Iteration,
    ) {
        let base_x = grid_u * SIZE as u32;
        let base_y = grid_v * SIZE as u32;
        for (v, row) in self.iterations.chunks_exact(SIZE).enumerate() {
            for (u, &iteration) in row.iter().enumerate() {
                surface.write_pixel(base_x + u as u32, base_y + v as u32, iteration, threshold);
            }
        }
    }

    pub fn get(&self, u: usize, v: usize) -> Iteration {
        self.iterations[v * SIZE + u]
    }

    pub fn iterations(&self) -> &[Iteration] {
        &self.iterations
    }
}

impl<const SIZE: usize> Default for Tile<SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Mandelbrot, TestImage};
    use mandelmap_core::{PixelRect, RectF};

    /// Records every write without colouring.
    #[derive(Default)]
    struct RecordingSurface {
        writes: Vec<(u32, u32, Iteration)>,
    }

    impl Surface for RecordingSurface {
        fn width(&self) -> u32 {
            u32::MAX
        }

        fn height(&self) -> u32 {
            u32::MAX
        }

        fn write_pixel(&mut self, x: u32, y: u32, iteration: Iteration, _threshold: Iteration) {
            self.writes.push((x, y, iteration));
        }

        fn flush(&mut self) {}

        fn blit(&self, _src: PixelRect, _target: &mut Self, _dst: RectF) {}
    }

    #[test]
    fn new_tile_has_size_squared_texels() {
        let tile = Tile::<4>::new();
        assert_eq!(tile.iterations().len(), 16);
        assert_eq!(Tile::<4>::EDGE, 4);
        assert_eq!(Tile::<TILE_SIZE>::EDGE, 256);
    }

    #[test]
    fn compute_samples_plane_downward_from_origin() {
        let mut tile = Tile::<4>::new();
        tile.compute(&TestImage::new(1.0), 10.0, -3.0, 1.0, 4096);

        for v in 0..4 {
            for u in 0..4 {
                let expected = TestImage::encode(10 + u as i64, 3 + v as i64);
                assert_eq!(tile.get(u, v), expected, "texel ({u}, {v})");
            }
        }
    }

    #[test]
    fn compute_is_deterministic() {
        let mut a = Tile::<16>::new();
        let mut b = Tile::<16>::new();
        a.compute(&Mandelbrot, -1.0, 0.5, 0.01, 200);
        b.compute(&Mandelbrot, -1.0, 0.5, 0.01, 200);
        assert_eq!(a.iterations(), b.iterations());

        // Recomputing over stale contents gives the same result.
        b.compute(&Mandelbrot, 0.3, 0.3, 0.2, 50);
        b.compute(&Mandelbrot, -1.0, 0.5, 0.01, 200);
        assert_eq!(a.iterations(), b.iterations());
    }

    #[test]
    fn draw_offsets_by_grid_cell() {
        let mut tile = Tile::<2>::new();
        tile.compute(&TestImage::new(1.0), 0.0, 0.0, 1.0, 4096);

        let mut surface = RecordingSurface::default();
        tile.draw(&mut surface, 3, 1, 4096);

        assert_eq!(
            surface.writes,
            vec![
                (6, 2, TestImage::encode(0, 0)),
                (7, 2, TestImage::encode(1, 0)),
                (6, 3, TestImage::encode(0, 1)),
                (7, 3, TestImage::encode(1, 1)),
            ]
        );
    }
}
