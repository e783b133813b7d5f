//! Shared helpers for tile map integration tests.

#![allow(dead_code)]

use mandelmap_compute::{
    for_each_blit_texel, EscapeKernel, Iteration, PixelRect, RectF, Surface, TestImage,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Surface that stores raw iteration counts, so tests can check exactly
/// which texel landed where.
pub struct IterationSurface {
    width: u32,
    height: u32,
    staging: Vec<Option<Iteration>>,
    committed: Vec<Option<Iteration>>,
    pub flushes: usize,
    pub targeted: usize,
}

impl IterationSurface {
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width * height) as usize;
        Self {
            width,
            height,
            staging: vec![None; len],
            committed: vec![None; len],
            flushes: 0,
            targeted: 0,
        }
    }

    /// Published count at `(x, y)`, or `None` if nothing landed there.
    pub fn get(&self, x: u32, y: u32) -> Option<Iteration> {
        self.committed[(y * self.width + x) as usize]
    }
}

impl Surface for IterationSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn write_pixel(&mut self, x: u32, y: u32, iteration: Iteration, _threshold: Iteration) {
        self.staging[(y * self.width + x) as usize] = Some(iteration);
    }

    fn flush(&mut self) {
        self.committed.copy_from_slice(&self.staging);
        self.flushes += 1;
    }

    fn blit(&self, src: PixelRect, target: &mut Self, dst: RectF) {
        let target_width = target.width;
        for_each_blit_texel(src, dst, target.width, target.height, |tx, ty, sx, sy| {
            target.committed[(ty * target_width + tx) as usize] =
                self.committed[(sy * self.width + sx) as usize];
        });
    }

    fn set_as_target(&mut self) {
        self.targeted += 1;
    }
}

/// `TestImage` that holds every caller until [`Gate::open`] is called.
pub struct Gate {
    image: TestImage,
    open: AtomicBool,
    calls: AtomicUsize,
}

impl Gate {
    pub fn new(texel_length: f64) -> Self {
        Self {
            image: TestImage::new(texel_length),
            open: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn open(&self) {
        self.open.store(true, Ordering::SeqCst);
    }

    /// Texels computed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EscapeKernel for Gate {
    fn iterations(&self, x: f64, y: f64, threshold: Iteration) -> Iteration {
        while !self.open.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(1));
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.image.iterations(x, y, threshold)
    }
}
