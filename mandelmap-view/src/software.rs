//! CPU surface backend.
//!
//! [`RgbaSurface`] keeps two pixel buffers: tile writes land in a staging
//! buffer and become visible to blits on [`Surface::flush`], the way a
//! streaming texture only shows what was uploaded.

use mandelmap_core::{
    color_for, for_each_blit_texel, Iteration, PixelRect, RectF, Surface, SurfaceAccess,
    SurfaceBackend, SurfaceError,
};

/// RGBA pixel with 8 bits per channel.
#[repr(C)]
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque pixel (alpha = 255).
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Row-major RGBA pixel buffer.
pub struct RgbaSurface {
    width: u32,
    height: u32,
    access: SurfaceAccess,
    staging: Box<[Rgba]>,
    pixels: Box<[Rgba]>,
    is_target: bool,
}

impl RgbaSurface {
    fn allocate(width: u32, height: u32, access: SurfaceAccess) -> Result<Self, SurfaceError> {
        let len = width as usize * height as usize;
        let buffer = || -> Result<Box<[Rgba]>, SurfaceError> {
            let mut data = Vec::new();
            data.try_reserve_exact(len)
                .map_err(|_| SurfaceError::Allocation { width, height })?;
            data.resize(len, Rgba::TRANSPARENT);
            Ok(data.into_boxed_slice())
        };

        Ok(Self {
            width,
            height,
            access,
            staging: buffer()?,
            pixels: buffer()?,
            is_target: false,
        })
    }

    pub fn access(&self) -> SurfaceAccess {
        self.access
    }

    /// Published pixel at `(x, y)`, or `None` if out of bounds.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        self.index_of(x, y).map(|i| self.pixels[i])
    }

    /// Published pixels, row-major.
    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    /// Whether draws are currently redirected here.
    pub fn is_target(&self) -> bool {
        self.is_target
    }

    /// Reset every published pixel.
    pub fn clear(&mut self, value: Rgba) {
        self.pixels.fill(value);
    }

    #[inline]
    fn index_of(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y < self.height {
            Some((y as usize) * (self.width as usize) + (x as usize))
        } else {
            None
        }
    }
}

impl Surface for RgbaSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn write_pixel(&mut self, x: u32, y: u32, iteration: Iteration, threshold: Iteration) {
        if let Some(i) = self.index_of(x, y) {
            let [r, g, b] = color_for(iteration, threshold);
            self.staging[i] = Rgba::rgb(r, g, b);
        }
    }

    fn flush(&mut self) {
        self.pixels.copy_from_slice(&self.staging);
    }

    fn blit(&self, src: PixelRect, target: &mut Self, dst: RectF) {
        let src_fits = src.x as u64 + src.width as u64 <= self.width as u64
            && src.y as u64 + src.height as u64 <= self.height as u64;
        if !src_fits {
            log::warn!(
                "Blit source {src:?} outside {}x{} surface",
                self.width,
                self.height
            );
            return;
        }

        let target_width = target.width as usize;
        for_each_blit_texel(src, dst, target.width, target.height, |tx, ty, sx, sy| {
            let from = sy as usize * self.width as usize + sx as usize;
            target.pixels[ty as usize * target_width + tx as usize] = self.pixels[from];
        });
    }

    fn set_as_target(&mut self) {
        self.is_target = true;
    }

    fn unset_as_target(&mut self) {
        self.is_target = false;
    }
}

/// Allocates [`RgbaSurface`]s in main memory.
#[derive(Clone, Copy, Debug)]
pub struct SoftwareBackend {
    /// Largest surface, in pixels, this backend will allocate.
    pub max_pixels: u64,
}

impl SoftwareBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for SoftwareBackend {
    fn default() -> Self {
        Self {
            max_pixels: mandelmap_core::PIXEL_INDEX_LIMIT,
        }
    }
}

impl SurfaceBackend for SoftwareBackend {
    type Surface = RgbaSurface;

    fn create_surface(
        &self,
        width: u32,
        height: u32,
        access: SurfaceAccess,
    ) -> Result<RgbaSurface, SurfaceError> {
        if width as u64 * height as u64 > self.max_pixels {
            return Err(SurfaceError::Allocation { width, height });
        }
        log::info!("Allocating {width}x{height} {access:?} surface");
        RgbaSurface::allocate(width, height, access)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(width: u32, height: u32) -> RgbaSurface {
        SoftwareBackend::new()
            .create_surface(width, height, SurfaceAccess::Streaming)
            .unwrap()
    }

    #[test]
    fn writes_are_hidden_until_flush() {
        let mut s = surface(4, 4);
        s.write_pixel(1, 2, 100, 100);
        assert_eq!(s.pixel(1, 2), Some(Rgba::TRANSPARENT));

        s.flush();
        assert_eq!(s.pixel(1, 2), Some(Rgba::rgb(0, 0, 0)));
    }

    #[test]
    fn write_pixel_colours_through_palette() {
        let mut s = surface(2, 1);
        s.write_pixel(0, 0, 0, 256);
        s.flush();
        let [r, g, b] = color_for(0, 256);
        assert_eq!(s.pixel(0, 0), Some(Rgba::rgb(r, g, b)));
    }

    #[test]
    fn out_of_bounds_writes_are_dropped() {
        let mut s = surface(2, 2);
        s.write_pixel(5, 0, 1, 10);
        s.flush();
        assert!(s.pixels().iter().all(|&p| p == Rgba::TRANSPARENT));
        assert_eq!(s.pixel(2, 0), None);
    }

    #[test]
    fn blit_copies_scaled_region() {
        let mut source = surface(4, 4);
        source.write_pixel(2, 1, 5, 100);
        source.flush();

        let mut target = surface(8, 8);
        source.blit(
            PixelRect::new(2, 1, 1, 1),
            &mut target,
            RectF::new(4.0, 4.0, 2.0, 2.0),
        );

        let expected = source.pixel(2, 1);
        assert_eq!(target.pixel(4, 4), expected);
        assert_eq!(target.pixel(5, 5), expected);
        assert_eq!(target.pixel(6, 6), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn blit_rejects_source_outside_surface() {
        let source = surface(2, 2);
        let mut target = surface(2, 2);
        target.clear(Rgba::rgb(1, 2, 3));
        source.blit(
            PixelRect::new(1, 1, 2, 2),
            &mut target,
            RectF::new(0.0, 0.0, 2.0, 2.0),
        );
        assert!(target.pixels().iter().all(|&p| p == Rgba::rgb(1, 2, 3)));
    }

    #[test]
    fn backend_refuses_oversized_surfaces() {
        let backend = SoftwareBackend { max_pixels: 100 };
        assert!(matches!(
            backend.create_surface(11, 10, SurfaceAccess::Static),
            Err(SurfaceError::Allocation {
                width: 11,
                height: 10
            })
        ));
        assert!(backend.create_surface(10, 10, SurfaceAccess::Target).is_ok());
    }

    #[test]
    fn target_flag_follows_redirection() {
        let mut s = surface(1, 1);
        assert!(!s.is_target());
        s.set_as_target();
        assert!(s.is_target());
        s.unset_as_target();
        assert!(!s.is_target());
    }
}
