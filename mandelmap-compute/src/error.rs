//! Tile map error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("tile grid has no tiles")]
    EmptyGrid,

    #[error("tile grid needs {pixels} surface pixels, more than the {limit} addressable")]
    GridTooLarge { pixels: u64, limit: u64 },

    #[error("texel length must be finite and positive, got {0}")]
    InvalidTexelLength(f64),

    #[error("failed to start compute pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
