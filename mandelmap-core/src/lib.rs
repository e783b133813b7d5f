pub mod config;
pub mod math;
pub mod palette;
pub mod plane;
pub mod rect;
pub mod surface;
pub mod wrap;

pub use config::{ConfigError, MapConfig, SceneConfig};
pub use math::{floor_div, floor_mod, FloorArith};
pub use palette::{color_for, Color};
pub use plane::{BufferWindow, PlaneRect, TileCoord};
pub use rect::{PixelRect, RectF};
pub use surface::{for_each_blit_texel, Surface, SurfaceAccess, SurfaceBackend, SurfaceError};
pub use wrap::{split_wrapped, WrapSegment};

/// Escape iteration count stored per tile texel.
pub type Iteration = u16;

/// Edge length of a tile in texels.
pub const TILE_SIZE: usize = 256;

/// Largest number of texels a backing surface may hold.
///
/// Pixel indices into a surface are `u32`, so the whole tile grid must fit.
pub const PIXEL_INDEX_LIMIT: u64 = u32::MAX as u64;
