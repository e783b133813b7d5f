//! Toroidal tile cache.
//!
//! A [`TileMap`] keeps a fixed grid of tiles and treats it as a sliding
//! window over the unbounded plane: plane tile `(u, v)` lives in grid cell
//! `(u mod grid_width, v mod grid_height)`. Panning only invalidates the
//! tiles that newly enter the window; everything still in view keeps its
//! cached counts.
//!
//! Tiles are computed on a rayon pool. A tile's storage moves into its
//! compute task and comes back over a channel, so the controller and a task
//! never share tile memory, and a slot with no tile is by construction not
//! dispatchable again until its task reports back.

use crate::{EscapeKernel, Mandelbrot, MapError, Tile, TileStatus};
use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures::StreamExt;
use mandelmap_core::{
    floor_div, floor_mod, split_wrapped, BufferWindow, Iteration, MapConfig, PlaneRect, RectF,
    Surface, TileCoord, PIXEL_INDEX_LIMIT, TILE_SIZE,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Largest grid edge in tiles. Keeps unwrapped window coordinates, which
/// may reach twice the grid edge, far from `TileCoord` overflow.
pub const MAX_GRID_EDGE: u32 = 1 << 15;

struct Slot<const SIZE: usize> {
    /// `None` while the tile is away in a compute task.
    tile: Option<Tile<SIZE>>,
    status: TileStatus,
}

struct Completion<const SIZE: usize> {
    index: usize,
    tile: Tile<SIZE>,
}

/// What one [`TileMap::dispatch`] sweep did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Finished tiles taken back from compute tasks.
    pub collected: usize,
    /// Compute tasks started.
    pub launched: usize,
    /// Tiles painted into the surface.
    pub drawn: usize,
    /// Compute tasks not yet finished after the sweep.
    pub in_flight: usize,
}

/// Build a compute pool for tile maps. `None` sizes it from the machine.
pub fn compute_pool(worker_threads: Option<usize>) -> Result<Arc<rayon::ThreadPool>, MapError> {
    let mut builder =
        rayon::ThreadPoolBuilder::new().thread_name(|i| format!("mandelmap-tile-{i}"));
    if let Some(threads) = worker_threads {
        builder = builder.num_threads(threads);
    }
    Ok(Arc::new(builder.build()?))
}

/// Wraparound grid of tiles with per-tile status.
pub struct TileMap<const SIZE: usize = TILE_SIZE> {
    slots: Vec<Slot<SIZE>>,
    window: BufferWindow,
    texel_length: f64,
    /// `texel_length * SIZE`
    tile_length: f64,
    grid_width: TileCoord,
    grid_height: TileCoord,
    kernel: Arc<dyn EscapeKernel>,
    pool: Arc<rayon::ThreadPool>,
    /// Compute tasks launched and not yet finished. Shared with the tasks.
    in_flight: Arc<AtomicUsize>,
    /// Tiles handed out and not yet taken back. Controller-only.
    away: usize,
    completed_tx: UnboundedSender<Completion<SIZE>>,
    completed_rx: UnboundedReceiver<Completion<SIZE>>,
}

impl<const SIZE: usize> TileMap<SIZE> {
    /// Map computing the Mandelbrot set on its own compute pool.
    pub fn new(config: &MapConfig) -> Result<Self, MapError> {
        let pool = compute_pool(config.worker_threads)?;
        Self::with_parts(config, Arc::new(Mandelbrot), pool)
    }

    /// Map with an explicit kernel and a (possibly shared) compute pool.
    pub fn with_parts(
        config: &MapConfig,
        kernel: Arc<dyn EscapeKernel>,
        pool: Arc<rayon::ThreadPool>,
    ) -> Result<Self, MapError> {
        if SIZE == 0 || config.grid_width == 0 || config.grid_height == 0 {
            return Err(MapError::EmptyGrid);
        }
        if !(config.texel_length.is_finite() && config.texel_length > 0.0) {
            return Err(MapError::InvalidTexelLength(config.texel_length));
        }

        let pixels = config.grid_width as u64
            * SIZE as u64
            * config.grid_height as u64
            * SIZE as u64;
        if pixels > PIXEL_INDEX_LIMIT
            || config.grid_width > MAX_GRID_EDGE
            || config.grid_height > MAX_GRID_EDGE
        {
            return Err(MapError::GridTooLarge {
                pixels,
                limit: PIXEL_INDEX_LIMIT,
            });
        }

        let tile_count = (config.grid_width * config.grid_height) as usize;
        let slots = (0..tile_count)
            .map(|_| Slot {
                tile: Some(Tile::new()),
                status: TileStatus::INIT,
            })
            .collect();

        log::info!(
            "Tile map: {}x{} tiles of {SIZE}x{SIZE} texels, texel length {}",
            config.grid_width,
            config.grid_height,
            config.texel_length
        );

        let (completed_tx, completed_rx) = unbounded();

        Ok(Self {
            slots,
            window: BufferWindow::default(),
            texel_length: config.texel_length,
            tile_length: config.texel_length * SIZE as f64,
            grid_width: config.grid_width as TileCoord,
            grid_height: config.grid_height as TileCoord,
            kernel,
            pool,
            in_flight: Arc::new(AtomicUsize::new(0)),
            away: 0,
            completed_tx,
            completed_rx,
        })
    }

    // =========================================================================
    // Window tracking
    // =========================================================================

    /// Move the window to cover `range`, marking newly exposed tiles for
    /// compute. Returns how many tiles were marked.
    ///
    /// A shift of more than a whole grid on either axis cannot overlap the
    /// old window, so every tile in the new window is marked without a
    /// per-tile comparison.
    pub fn update_window(&mut self, range: PlaneRect) -> usize {
        if ![range.x, range.y, range.width, range.height]
            .iter()
            .all(|c| c.is_finite())
        {
            log::warn!("Ignoring non-finite range {range:?}");
            return 0;
        }

        let old = self.window;
        log::trace!("Window before update: {old:?}");

        // Shifts stay in plane-derived f64 until known to be small.
        let shift_u = floor_div(range.x - old.anchor_x, self.tile_length);
        let shift_v = floor_div(old.anchor_y - range.y, self.tile_length);

        let anchor_x = old.anchor_x + shift_u * self.tile_length;
        let anchor_y = old.anchor_y - shift_v * self.tile_length;
        let width = self.extent(range.right() - anchor_x, self.grid_width);
        let height = self.extent(anchor_y - range.bottom(), self.grid_height);

        let grid_width = self.grid_width as f64;
        let grid_height = self.grid_height as f64;

        let marked = if shift_u.abs() > grid_width || shift_v.abs() > grid_height {
            log::trace!("Shift ({shift_u}, {shift_v}) exceeds grid, marking whole window");

            let du = floor_mod(shift_u, grid_width) as TileCoord;
            let dv = floor_mod(shift_v, grid_height) as TileCoord;
            self.window = BufferWindow {
                anchor_x,
                anchor_y,
                u: floor_mod(old.u + du, self.grid_width),
                v: floor_mod(old.v + dv, self.grid_height),
                width,
                height,
            };

            let window = self.window;
            for (u, v) in window.tiles() {
                self.mark(u, v);
            }
            window.tile_count()
        } else {
            // Unwrapped, so it can be compared against the old window.
            let moved = BufferWindow {
                anchor_x,
                anchor_y,
                u: old.u + shift_u as TileCoord,
                v: old.v + shift_v as TileCoord,
                width,
                height,
            };

            let mut marked = 0;
            for (u, v) in moved.tiles().filter(|&(u, v)| !old.contains(u, v)) {
                self.mark(u, v);
                marked += 1;
            }

            self.window = BufferWindow {
                u: floor_mod(moved.u, self.grid_width),
                v: floor_mod(moved.v, self.grid_height),
                ..moved
            };
            marked
        };

        log::trace!("Window after update: {:?}, {marked} tiles marked", self.window);
        marked
    }

    /// Tiles needed to span `span` plane units from the anchor, at least
    /// one and never more than the grid holds.
    fn extent(&self, span: f64, limit: TileCoord) -> TileCoord {
        let tiles = 1.0 + floor_div(span, self.tile_length);
        if tiles > limit as f64 {
            log::warn!("Range needs {tiles} tiles but the grid holds {limit}, clamping");
        }
        tiles.clamp(1.0, limit as f64) as TileCoord
    }

    fn mark(&mut self, u: TileCoord, v: TileCoord) {
        let index = self.slot_index(u, v);
        log::trace!("Mark tile ({u}, {v}) for compute, slot {index}");
        self.slots[index].status.insert(TileStatus::NEEDS_COMPUTE);
    }

    fn slot_index(&self, u: TileCoord, v: TileCoord) -> usize {
        let u = floor_mod(u, self.grid_width);
        let v = floor_mod(v, self.grid_height);
        (v * self.grid_width + u) as usize
    }

    // =========================================================================
    // Work dispatch
    // =========================================================================

    /// Sweep the window: launch compute for tiles marked `NEEDS_COMPUTE`
    /// and paint tiles marked `NEEDS_DRAW` into `surface`.
    ///
    /// Never waits on a compute task. Tiles finished since the last sweep
    /// are taken back first, so a tile launched now is drawn on a later
    /// call. The surface is flushed once if anything was painted.
    pub fn dispatch<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
        threshold: Iteration,
    ) -> DispatchStats {
        let collected = self.collect_completed();
        let mut launched = 0;
        let mut drawn = 0;

        let window = self.window;
        for (u, v) in window.tiles() {
            // The window never spans more than one grid, so `%` suffices.
            let grid_u = u % self.grid_width;
            let grid_v = v % self.grid_height;
            let index = (grid_v * self.grid_width + grid_u) as usize;
            let slot = &mut self.slots[index];

            if slot.status.contains(TileStatus::NEEDS_COMPUTE) {
                // Still away: stays marked until its task reports back.
                let Some(tile) = slot.tile.take() else {
                    continue;
                };
                slot.status = TileStatus::IDLE;

                let origin_x = window.anchor_x + (u - window.u) as f64 * self.tile_length;
                let origin_y = window.anchor_y - (v - window.v) as f64 * self.tile_length;
                self.launch(index, tile, origin_x, origin_y, threshold);
                launched += 1;
            } else if slot.status.contains(TileStatus::NEEDS_DRAW) {
                slot.status.remove(TileStatus::NEEDS_DRAW);
                if let Some(tile) = &slot.tile {
                    tile.draw(surface, grid_u as u32, grid_v as u32, threshold);
                    drawn += 1;
                }
            }
        }

        if drawn > 0 {
            surface.flush();
        }

        let stats = DispatchStats {
            collected,
            launched,
            drawn,
            in_flight: self.in_flight(),
        };
        if launched > 0 || drawn > 0 {
            log::debug!("Dispatch: {stats:?}");
        }
        stats
    }

    fn launch(
        &mut self,
        index: usize,
        mut tile: Tile<SIZE>,
        origin_x: f64,
        origin_y: f64,
        threshold: Iteration,
    ) {
        let kernel = Arc::clone(&self.kernel);
        let in_flight = Arc::clone(&self.in_flight);
        let completed = self.completed_tx.clone();
        let texel_length = self.texel_length;

        in_flight.fetch_add(1, Ordering::Relaxed);
        self.away += 1;

        self.pool.spawn(move || {
            tile.compute(kernel.as_ref(), origin_x, origin_y, texel_length, threshold);
            in_flight.fetch_sub(1, Ordering::Relaxed);
            // Fails only once the map is gone; the tile is dropped here then.
            let _ = completed.unbounded_send(Completion { index, tile });
        });
    }

    /// Take back every tile whose task has already reported, without
    /// blocking. Returns how many came back.
    pub fn collect_completed(&mut self) -> usize {
        let mut collected = 0;
        while let Ok(Some(done)) = self.completed_rx.try_next() {
            self.accept(done);
            collected += 1;
        }
        collected
    }

    /// Block until every launched tile is back. Returns how many came back.
    pub fn wait_for_completions(&mut self) -> usize {
        let mut collected = 0;
        while self.away > 0 {
            match futures::executor::block_on(self.completed_rx.next()) {
                Some(done) => {
                    self.accept(done);
                    collected += 1;
                }
                None => break,
            }
        }
        collected
    }

    fn accept(&mut self, done: Completion<SIZE>) {
        self.away -= 1;
        let slot = &mut self.slots[done.index];
        debug_assert!(slot.tile.is_none(), "tile returned to an occupied slot");
        slot.tile = Some(done.tile);
        // Re-marked while away: the result is stale and must not be drawn.
        if !slot.status.contains(TileStatus::NEEDS_COMPUTE) {
            slot.status.insert(TileStatus::NEEDS_DRAW);
        }
    }

    // =========================================================================
    // Output
    // =========================================================================

    /// Blit the part of `source` showing `range` onto `target`, scaled so one
    /// plane unit spans `1 / pixel_length` target pixels. Returns the number
    /// of blits.
    ///
    /// `source` holds the grid's texels at their wrapped positions, so the
    /// window is cut at the grid's right and bottom edges into up to four
    /// pieces which land side by side on `target`.
    pub fn render<S: Surface>(
        &self,
        source: &S,
        target: &mut S,
        range: PlaneRect,
        pixel_length: f64,
    ) -> usize {
        if !(pixel_length.is_finite() && pixel_length > 0.0) {
            log::warn!("Skipping render with pixel length {pixel_length}");
            return 0;
        }

        let (buffer_width, buffer_height) = self.surface_size();
        let size = SIZE as i64;

        // Offset of the range from the window anchor, in texels.
        let offset_x = ((range.x - self.window.anchor_x) / self.texel_length).max(0.0);
        let offset_y = ((self.window.anchor_y - range.y) / self.texel_length).max(0.0);
        let whole_x = offset_x.floor();
        let whole_y = offset_y.floor();
        let frac_x = offset_x - whole_x;
        let frac_y = offset_y - whole_y;

        let src_x = floor_mod(self.window.u as i64 * size + whole_x as i64, buffer_width as i64);
        let src_y = floor_mod(self.window.v as i64 * size + whole_y as i64, buffer_height as i64);
        let need_w = (frac_x + range.width / self.texel_length).ceil().max(0.0) as u32;
        let need_h = (frac_y + range.height / self.texel_length).ceil().max(0.0) as u32;

        let scale = self.texel_length / pixel_length;
        let left = -frac_x * scale;
        let top = -frac_y * scale;

        let segments = split_wrapped(
            src_x as u32,
            src_y as u32,
            need_w,
            need_h,
            buffer_width,
            buffer_height,
        );

        target.set_as_target();
        for segment in &segments {
            let dst = RectF::new(
                (left + segment.offset_x as f64 * scale) as f32,
                (top + segment.offset_y as f64 * scale) as f32,
                (segment.src.width as f64 * scale) as f32,
                (segment.src.height as f64 * scale) as f32,
            );
            log::trace!("Blit {:?} -> {dst:?}", segment.src);
            source.blit(segment.src, target, dst);
        }
        target.unset_as_target();

        segments.len()
    }

    // =========================================================================
    // Invalidation and scale
    // =========================================================================

    /// Mark every tile for compute, e.g. after the threshold changed.
    pub fn recompute(&mut self) {
        for slot in &mut self.slots {
            slot.status = TileStatus::INIT;
        }
    }

    /// Mark every resident, settled tile for drawing, so a surface shared
    /// with another map is repainted from cached counts.
    pub fn redraw_resident(&mut self) -> usize {
        let mut marked = 0;
        for slot in &mut self.slots {
            if slot.tile.is_some() && slot.status.is_idle() {
                slot.status.insert(TileStatus::NEEDS_DRAW);
                marked += 1;
            }
        }
        marked
    }

    /// Switch to a new texel length. Every cached tile becomes invalid.
    pub fn change_texel_length(&mut self, texel_length: f64) -> Result<(), MapError> {
        if !(texel_length.is_finite() && texel_length > 0.0) {
            return Err(MapError::InvalidTexelLength(texel_length));
        }
        log::info!("Texel length {} -> {texel_length}", self.texel_length);
        self.texel_length = texel_length;
        self.tile_length = texel_length * SIZE as f64;
        self.recompute();
        Ok(())
    }

    /// Smallest pixel length this map can show without magnifying texels.
    pub fn min_pixel_length(&self) -> f64 {
        self.texel_length
    }

    /// Largest pixel length whose screen still fits in the grid with one
    /// tile of slack for a misaligned anchor.
    pub fn max_pixel_length(&self, screen_width: u32, screen_height: u32) -> f64 {
        let by_width = self.usable_texels(self.grid_width) / screen_width as f64;
        let by_height = self.usable_texels(self.grid_height) / screen_height as f64;
        by_width.min(by_height) * self.texel_length
    }

    /// Texel length whose [`max_pixel_length`](Self::max_pixel_length) is
    /// this map's [`min_pixel_length`](Self::min_pixel_length).
    pub fn next_smaller_texel_length(&self, screen_width: u32, screen_height: u32) -> f64 {
        let by_width = screen_width as f64 / self.usable_texels(self.grid_width);
        let by_height = screen_height as f64 / self.usable_texels(self.grid_height);
        by_width.max(by_height) * self.min_pixel_length()
    }

    /// Texel length whose [`min_pixel_length`](Self::min_pixel_length) is
    /// this map's [`max_pixel_length`](Self::max_pixel_length).
    pub fn prev_larger_texel_length(&self, screen_width: u32, screen_height: u32) -> f64 {
        self.max_pixel_length(screen_width, screen_height)
    }

    fn usable_texels(&self, grid_edge: TileCoord) -> f64 {
        ((grid_edge - 1) as f64) * SIZE as f64
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn texel_length(&self) -> f64 {
        self.texel_length
    }

    pub fn tile_length(&self) -> f64 {
        self.tile_length
    }

    pub fn window(&self) -> BufferWindow {
        self.window
    }

    /// Grid size in tiles.
    pub fn grid_size(&self) -> (u32, u32) {
        (self.grid_width as u32, self.grid_height as u32)
    }

    /// Backing surface size in texels.
    pub fn surface_size(&self) -> (u32, u32) {
        (
            self.grid_width as u32 * SIZE as u32,
            self.grid_height as u32 * SIZE as u32,
        )
    }

    /// Status of the slot for tile `(u, v)`; coordinates are wrapped.
    pub fn status(&self, u: TileCoord, v: TileCoord) -> TileStatus {
        self.slots[self.slot_index(u, v)].status
    }

    /// The tile for `(u, v)` if it is not away in a compute task.
    pub fn tile(&self, u: TileCoord, v: TileCoord) -> Option<&Tile<SIZE>> {
        self.slots[self.slot_index(u, v)].tile.as_ref()
    }

    /// Compute tasks launched and not yet finished.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Tiles handed to compute tasks and not yet taken back.
    pub fn pending(&self) -> usize {
        self.away
    }
}

impl<const SIZE: usize> Drop for TileMap<SIZE> {
    fn drop(&mut self) {
        if self.away > 0 {
            log::info!("Waiting for {} tile computations to end...", self.away);
        }
        self.wait_for_completions();
    }
}
