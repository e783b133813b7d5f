pub mod error;
pub mod kernel;
pub mod map;
pub mod status;
pub mod tile;

pub use error::MapError;
pub use kernel::{EscapeKernel, Mandelbrot, TestImage};
pub use map::{compute_pool, DispatchStats, TileMap, MAX_GRID_EDGE};
pub use status::TileStatus;
pub use tile::Tile;

// Re-export core types for convenience
pub use mandelmap_core::*;
