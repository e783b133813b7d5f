//! Viewport controller.
//!
//! A [`Scene`] turns pans and zooms into plane rectangles and drives two
//! tile maps at different texel lengths. Only the active map computes and
//! draws; the other keeps its cache so zooming back to its scale reuses it.
//! Both draw into one backing surface sized to the tile grid.

use crate::SceneError;
use mandelmap_compute::{compute_pool, DispatchStats, EscapeKernel, Mandelbrot, TileMap};
use mandelmap_core::{
    Iteration, PixelRect, PlaneRect, RectF, SceneConfig, Surface, SurfaceAccess, SurfaceBackend,
    TILE_SIZE,
};
use std::sync::Arc;

/// Threshold change per raise/lower step.
pub const THRESHOLD_STEP: Iteration = 128;

/// Upper bound on scale steps taken by one zoom.
const MAX_SCALE_STEPS: usize = 256;

/// Relative tolerance when deciding a map already sits at a texel length.
const SCALE_TOLERANCE: f64 = 1e-9;

/// Raise the escape threshold by one step, saturating at the type's maximum.
pub fn raise_threshold(threshold: Iteration) -> Iteration {
    threshold.saturating_add(THRESHOLD_STEP)
}

/// Lower the escape threshold by one step, never below one step.
pub fn lower_threshold(threshold: Iteration) -> Iteration {
    if threshold > THRESHOLD_STEP {
        threshold - THRESHOLD_STEP
    } else {
        threshold
    }
}

/// Which of the scene's two maps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapSlot {
    Front,
    Back,
}

impl MapSlot {
    fn index(self) -> usize {
        match self {
            MapSlot::Front => 0,
            MapSlot::Back => 1,
        }
    }

    pub fn other(self) -> Self {
        match self {
            MapSlot::Front => MapSlot::Back,
            MapSlot::Back => MapSlot::Front,
        }
    }
}

pub struct Scene<B: SurfaceBackend, const SIZE: usize = TILE_SIZE> {
    backend: B,
    texture: B::Surface,
    maps: [TileMap<SIZE>; 2],
    active: MapSlot,
    range: PlaneRect,
    pixel_length: f64,
    draw_width: u32,
    draw_height: u32,
    min_pixel_length: f64,
    max_pixel_length: f64,
    /// Threshold of the last update, to notice changes.
    threshold: Option<Iteration>,
}

impl<B: SurfaceBackend, const SIZE: usize> Scene<B, SIZE> {
    /// Scene computing the Mandelbrot set.
    pub fn new(backend: B, config: &SceneConfig) -> Result<Self, SceneError> {
        Self::with_kernel(backend, config, Arc::new(Mandelbrot))
    }

    pub fn with_kernel(
        backend: B,
        config: &SceneConfig,
        kernel: Arc<dyn EscapeKernel>,
    ) -> Result<Self, SceneError> {
        config.validate()?;

        let pool = compute_pool(config.worker_threads)?;
        let map_config = config.map_config();
        let front = TileMap::with_parts(&map_config, kernel.clone(), pool.clone())?;
        let back = TileMap::with_parts(&map_config, kernel, pool)?;

        // Every scale must leave room to move, or zooming could never settle.
        let (width, height) = (config.draw_width, config.draw_height);
        if front.max_pixel_length(width, height) <= front.min_pixel_length() {
            return Err(SceneError::DrawAreaTooLarge { width, height });
        }

        let (texture_width, texture_height) = front.surface_size();
        let texture =
            backend.create_surface(texture_width, texture_height, SurfaceAccess::Streaming)?;
        log::info!("Texture size: {texture_width} * {texture_height}");

        let mut scene = Self {
            backend,
            texture,
            maps: [front, back],
            active: MapSlot::Front,
            range: PlaneRect::default(),
            pixel_length: config.pixel_length,
            draw_width: width,
            draw_height: height,
            min_pixel_length: config.min_pixel_length,
            max_pixel_length: config.max_pixel_length,
            threshold: None,
        };

        let pixel_length = scene.clamp_pixel_length(config.pixel_length);
        scene.retarget_scale(pixel_length);
        scene.set_range(config.origin_x, config.origin_y, pixel_length);
        Ok(scene)
    }

    /// Allocate a surface the size of the draw area to render into.
    pub fn create_draw_area(&self) -> Result<B::Surface, SceneError> {
        Ok(self
            .backend
            .create_surface(self.draw_width, self.draw_height, SurfaceAccess::Target)?)
    }

    // =========================================================================
    // View movement
    // =========================================================================

    /// Show the plane from `(origin_x, origin_y)` at `pixel_length` plane
    /// units per screen pixel.
    pub fn set_range(&mut self, origin_x: f64, origin_y: f64, pixel_length: f64) {
        self.range = PlaneRect::new(
            origin_x,
            origin_y,
            self.draw_width as f64 * pixel_length,
            self.draw_height as f64 * pixel_length,
        );
        self.pixel_length = pixel_length;
    }

    /// Move the view by a screen-pixel delta. Screen y grows downward.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        log::trace!("Movement ({dx}, {dy}) {}", self.pixel_length);
        self.range.x += dx * self.pixel_length;
        self.range.y -= dy * self.pixel_length;
    }

    /// Scale the pixel length by `multiplier`, keeping the plane point under
    /// screen pixel `(cx, cy)` in place.
    ///
    /// Requests outside the configured pixel length bounds are clamped. When
    /// the new pixel length leaves the active map's workable range, the
    /// other map takes over at a texel length that fits.
    pub fn zoom(&mut self, cx: f64, cy: f64, multiplier: f64) {
        let requested = self.pixel_length * multiplier;
        if requested.is_nan() {
            log::warn!("Ignoring zoom by {multiplier}");
            return;
        }

        let pixel_length = self.clamp_pixel_length(requested);
        self.retarget_scale(pixel_length);

        let delta = pixel_length - self.pixel_length;
        self.range.x -= cx * delta;
        self.range.y += cy * delta;
        self.set_range(self.range.x, self.range.y, pixel_length);
    }

    fn clamp_pixel_length(&self, pixel_length: f64) -> f64 {
        if pixel_length > self.max_pixel_length {
            log::warn!("Zoom reached maximum ({})", self.max_pixel_length);
            self.max_pixel_length
        } else if pixel_length < self.min_pixel_length {
            log::warn!("Zoom reached minimum ({})", self.min_pixel_length);
            self.min_pixel_length
        } else {
            pixel_length
        }
    }

    /// Make sure the active map can show `pixel_length`, switching maps if
    /// it cannot.
    fn retarget_scale(&mut self, pixel_length: f64) {
        let (width, height) = (self.draw_width, self.draw_height);
        let active = &self.maps[self.active.index()];

        let mut texel_length = active.texel_length();
        let finer = active.next_smaller_texel_length(width, height) / texel_length;
        let mut steps = 0;

        // Workable range for texel length t is [t, t / finer].
        while pixel_length < texel_length && steps < MAX_SCALE_STEPS {
            texel_length *= finer;
            steps += 1;
        }
        while pixel_length > texel_length / finer && steps < MAX_SCALE_STEPS {
            texel_length /= finer;
            steps += 1;
        }

        if steps == 0 {
            return;
        }
        if steps == MAX_SCALE_STEPS {
            log::warn!("Scale did not settle for pixel length {pixel_length}");
        }
        self.switch_to(texel_length);
    }

    fn switch_to(&mut self, texel_length: f64) {
        let next = self.active.other();
        let map = &mut self.maps[next.index()];

        let current = map.texel_length();
        if (current - texel_length).abs() <= current * SCALE_TOLERANCE {
            log::info!("Switching to {next:?} map, reusing texel length {current}");
        } else {
            log::info!("Switching to {next:?} map at texel length {texel_length}");
            if let Err(err) = map.change_texel_length(texel_length) {
                log::warn!("Keeping {:?} map: {err}", self.active);
                return;
            }
        }

        // The shared texture holds the old map's pixels.
        map.redraw_resident();
        self.active = next;
    }

    // =========================================================================
    // Frame steps
    // =========================================================================

    /// Bring the active map up to date with the current range and run one
    /// dispatch sweep. A changed threshold invalidates both maps first.
    pub fn update(&mut self, threshold: Iteration) -> DispatchStats {
        if self.threshold.is_some_and(|previous| previous != threshold) {
            log::info!("Threshold changed to {threshold}, recomputing");
            self.recompute();
        }
        self.threshold = Some(threshold);

        log::trace!(
            "(x, y): ({}, {}) screen width: {} with pixel length {}",
            self.range.x,
            self.range.y,
            self.range.width,
            self.pixel_length
        );

        let map = &mut self.maps[self.active.index()];
        map.update_window(self.range);
        map.dispatch(&mut self.texture, threshold)
    }

    /// Update until every tile in view is computed and drawn.
    pub fn finish_pending(&mut self, threshold: Iteration) -> DispatchStats {
        let mut total = DispatchStats::default();
        loop {
            let stats = self.update(threshold);
            total.collected += stats.collected;
            total.launched += stats.launched;
            total.drawn += stats.drawn;

            let map = &mut self.maps[self.active.index()];
            if stats.launched == 0 && map.pending() == 0 {
                total.in_flight = map.in_flight();
                return total;
            }
            total.collected += map.wait_for_completions();
        }
    }

    /// Draw the current view onto `screen`.
    pub fn render(&self, screen: &mut B::Surface) -> usize {
        self.active_map()
            .render(&self.texture, screen, self.range, self.pixel_length)
    }

    /// Draw the whole backing texture into `dst` of `screen`.
    pub fn debug_render(&self, screen: &mut B::Surface, dst: RectF) {
        let src = PixelRect::new(0, 0, self.texture.width(), self.texture.height());
        screen.set_as_target();
        self.texture.blit(src, screen, dst);
        screen.unset_as_target();
    }

    /// Recompute every tile of both maps.
    pub fn recompute(&mut self) {
        for map in &mut self.maps {
            map.recompute();
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Plane coordinate under screen pixel `(px, py)`.
    pub fn plane_point(&self, px: f64, py: f64) -> (f64, f64) {
        (
            self.range.x + px * self.pixel_length,
            self.range.y - py * self.pixel_length,
        )
    }

    pub fn range(&self) -> PlaneRect {
        self.range
    }

    pub fn pixel_length(&self) -> f64 {
        self.pixel_length
    }

    pub fn draw_size(&self) -> (u32, u32) {
        (self.draw_width, self.draw_height)
    }

    pub fn active_slot(&self) -> MapSlot {
        self.active
    }

    pub fn active_map(&self) -> &TileMap<SIZE> {
        &self.maps[self.active.index()]
    }

    pub fn map(&self, slot: MapSlot) -> &TileMap<SIZE> {
        &self.maps[slot.index()]
    }

    pub fn texture(&self) -> &B::Surface {
        &self.texture
    }
}
