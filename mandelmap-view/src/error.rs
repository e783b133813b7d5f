use mandelmap_compute::MapError;
use mandelmap_core::{ConfigError, SurfaceError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("invalid scene config: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to read config {}: {source}", path.display())]
    ReadConfig {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Map(#[from] MapError),

    #[error("backing surface: {0}")]
    Surface(#[from] SurfaceError),

    #[error("draw area {width}x{height} does not fit the tile grid with a tile to spare")]
    DrawAreaTooLarge { width: u32, height: u32 },
}
