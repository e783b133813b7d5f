//! Scripted pan/zoom session without a window.
//!
//! Usage: `mandelmap-headless [config.json]`. Set `RUST_LOG=debug` to see
//! per-frame dispatch summaries.

use mandelmap_compute::{DispatchStats, Iteration};
use mandelmap_view::{load_config_or_default, raise_threshold, Scene, SoftwareBackend};
use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;

/// Simulated frame time in seconds.
const FRAME_TIME: f64 = 0.020;
/// Pan speed in screen pixels per second.
const MOVE_SPEED: f64 = 200.0;
/// Zoom factor per frame.
const ZOOM_SPEED: f64 = 1.01;

#[derive(Clone, Copy, Debug)]
enum Step {
    Pan { dx: f64, dy: f64 },
    ZoomIn,
    ZoomOut,
    RaiseThreshold,
}

/// The scripted session: `(frames, step)` pairs, run in order.
const SCRIPT: &[(usize, Step)] = &[
    (50, Step::Pan { dx: 1.0, dy: 0.0 }),
    (25, Step::Pan { dx: 0.0, dy: 1.0 }),
    (150, Step::ZoomIn),
    (1, Step::RaiseThreshold),
    (50, Step::Pan { dx: -1.0, dy: -1.0 }),
    (150, Step::ZoomOut),
];

#[derive(Default)]
struct Totals {
    frames: usize,
    launched: usize,
    drawn: usize,
    blits: usize,
}

impl Totals {
    fn add(&mut self, stats: DispatchStats, blits: usize) {
        self.frames += 1;
        self.launched += stats.launched;
        self.drawn += stats.drawn;
        self.blits += blits;
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = load_config_or_default(path.as_deref())?;
    let mut threshold: Iteration = config.threshold;

    let mut scene: Scene<SoftwareBackend> = Scene::new(SoftwareBackend::new(), &config)?;
    let mut screen = scene.create_draw_area()?;
    let (width, height) = scene.draw_size();
    let (center_x, center_y) = (width as f64 / 2.0, height as f64 / 2.0);
    let step_pixels = MOVE_SPEED * FRAME_TIME;

    let started = Instant::now();
    let mut totals = Totals::default();

    for &(frames, step) in SCRIPT {
        log::info!("{frames} frames of {step:?}");
        for _ in 0..frames {
            match step {
                Step::Pan { dx, dy } => scene.pan(dx * step_pixels, dy * step_pixels),
                Step::ZoomIn => scene.zoom(center_x, center_y, 1.0 / ZOOM_SPEED),
                Step::ZoomOut => scene.zoom(center_x, center_y, ZOOM_SPEED),
                Step::RaiseThreshold => threshold = raise_threshold(threshold),
            }
            let stats = scene.update(threshold);
            let blits = scene.render(&mut screen);
            totals.add(stats, blits);
        }
    }

    let settled = scene.finish_pending(threshold);
    scene.render(&mut screen);

    let (x, y) = scene.plane_point(center_x, center_y);
    log::info!(
        "{} frames in {:.2?}: {} tiles launched, {} drawn, {} blits; settling drew {} more",
        totals.frames,
        started.elapsed(),
        totals.launched,
        totals.drawn,
        totals.blits,
        settled.drawn
    );
    log::info!(
        "Final view centred on ({x}, {y}) at pixel length {} on the {:?} map",
        scene.pixel_length(),
        scene.active_slot()
    );

    Ok(())
}
