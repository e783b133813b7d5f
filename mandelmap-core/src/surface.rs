//! Surface capability consumed by the tile cache.
//!
//! A surface receives coloured iteration counts from tiles, publishes them
//! on [`Surface::flush`], and copies scaled sub-rectangles to another
//! surface. Backends are chosen by whoever builds the scene; the cache only
//! sees this trait.

use crate::{Iteration, PixelRect, RectF};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a surface will be used once created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceAccess {
    /// Written once, read many times.
    #[default]
    Static,
    /// Rewritten frequently from the CPU and flushed in batches.
    Streaming,
    /// Destination of blits.
    Target,
}

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("failed to allocate a {width}x{height} surface")]
    Allocation { width: u32, height: u32 },

    #[error("surface device lost: {0}")]
    DeviceLost(String),
}

/// Pixel storage a tile can colour into and blit out of.
pub trait Surface {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Colour the pixel at `(x, y)` for an iteration count.
    ///
    /// Writes may be staged; they become visible to [`Surface::blit`] after
    /// the next [`Surface::flush`].
    fn write_pixel(&mut self, x: u32, y: u32, iteration: Iteration, threshold: Iteration);

    /// Publish staged writes.
    fn flush(&mut self);

    /// Copy `src` of this surface onto `dst` of `target`, scaling to fit.
    fn blit(&self, src: PixelRect, target: &mut Self, dst: RectF)
    where
        Self: Sized;

    /// Redirect subsequent draws to this surface.
    fn set_as_target(&mut self) {}

    fn unset_as_target(&mut self) {}
}

/// Rendering context that allocates surfaces.
///
/// Passed explicitly to whatever needs to create surfaces; there is no
/// process-wide renderer.
pub trait SurfaceBackend {
    type Surface: Surface;

    fn create_surface(
        &self,
        width: u32,
        height: u32,
        access: SurfaceAccess,
    ) -> Result<Self::Surface, SurfaceError>;
}

/// Nearest-texel mapping for a scaled blit.
///
/// Calls `f(target_x, target_y, source_x, source_y)` once for every target
/// pixel whose centre falls inside `dst` and inside the
/// `target_width` x `target_height` target. Source coordinates always lie
/// inside `src`.
pub fn for_each_blit_texel(
    src: PixelRect,
    dst: RectF,
    target_width: u32,
    target_height: u32,
    mut f: impl FnMut(u32, u32, u32, u32),
) {
    if src.is_empty() || dst.is_empty() {
        return;
    }

    let (x0, x1) = pixel_span(dst.x, dst.width, target_width);
    let (y0, y1) = pixel_span(dst.y, dst.height, target_height);
    let scale_x = src.width as f32 / dst.width;
    let scale_y = src.height as f32 / dst.height;

    for ty in y0..y1 {
        let sy = sample(ty, dst.y, scale_y, src.height);
        for tx in x0..x1 {
            let sx = sample(tx, dst.x, scale_x, src.width);
            f(tx, ty, src.x + sx, src.y + sy);
        }
    }
}

/// Target pixels whose centres lie in `[start, start + extent)`, clipped.
fn pixel_span(start: f32, extent: f32, limit: u32) -> (u32, u32) {
    let first = (start - 0.5).ceil().max(0.0);
    let end = (start + extent - 0.5).ceil().max(0.0);
    let first = (first as u64).min(limit as u64) as u32;
    let end = (end as u64).min(limit as u64) as u32;
    (first, end.max(first))
}

fn sample(target: u32, start: f32, scale: f32, extent: u32) -> u32 {
    let offset = ((target as f32 + 0.5 - start) * scale).floor().max(0.0) as u32;
    offset.min(extent - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(src: PixelRect, dst: RectF, tw: u32, th: u32) -> Vec<(u32, u32, u32, u32)> {
        let mut out = Vec::new();
        for_each_blit_texel(src, dst, tw, th, |tx, ty, sx, sy| out.push((tx, ty, sx, sy)));
        out
    }

    #[test]
    fn unscaled_blit_is_identity_shift() {
        let texels = collect(
            PixelRect::new(4, 2, 3, 2),
            RectF::new(10.0, 20.0, 3.0, 2.0),
            64,
            64,
        );
        assert_eq!(texels.len(), 6);
        assert_eq!(texels[0], (10, 20, 4, 2));
        assert_eq!(texels[5], (12, 21, 6, 3));
    }

    #[test]
    fn doubled_blit_repeats_texels() {
        let texels = collect(
            PixelRect::new(0, 0, 2, 1),
            RectF::new(0.0, 0.0, 4.0, 2.0),
            64,
            64,
        );
        let sources: Vec<_> = texels.iter().filter(|t| t.1 == 0).map(|t| t.2).collect();
        assert_eq!(sources, vec![0, 0, 1, 1]);
    }

    #[test]
    fn blit_is_clipped_to_target() {
        let texels = collect(
            PixelRect::new(0, 0, 8, 8),
            RectF::new(-2.0, -2.0, 8.0, 8.0),
            4,
            4,
        );
        assert_eq!(texels.len(), 16);
        assert!(texels.contains(&(0, 0, 2, 2)));
        assert!(texels.iter().all(|t| t.0 < 4 && t.1 < 4));
    }

    #[test]
    fn empty_rects_do_nothing() {
        assert!(collect(PixelRect::new(0, 0, 0, 4), RectF::new(0.0, 0.0, 4.0, 4.0), 8, 8).is_empty());
        assert!(collect(PixelRect::new(0, 0, 4, 4), RectF::new(0.0, 0.0, 0.0, 4.0), 8, 8).is_empty());
    }

    #[test]
    fn surface_access_defaults_to_static() {
        assert_eq!(SurfaceAccess::default(), SurfaceAccess::Static);
    }
}
