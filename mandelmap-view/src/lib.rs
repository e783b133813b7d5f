pub mod config;
pub mod error;
pub mod scene;
pub mod software;

pub use config::{load_config, load_config_or_default};
pub use error::SceneError;
pub use scene::{lower_threshold, raise_threshold, MapSlot, Scene, THRESHOLD_STEP};
pub use software::{Rgba, RgbaSurface, SoftwareBackend};
