//! Scene configuration loading.
//!
//! Settings come from an optional JSON file; anything it leaves out keeps
//! the [`SceneConfig`] default.

use crate::SceneError;
use mandelmap_core::SceneConfig;
use std::path::Path;

/// Read and validate a scene config from a JSON file.
pub fn load_config(path: &Path) -> Result<SceneConfig, SceneError> {
    let json = std::fs::read_to_string(path).map_err(|source| SceneError::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;
    let config = SceneConfig::from_json(&json)?;
    log::info!("Loaded scene config from {}", path.display());
    Ok(config)
}

/// Config from `path` if given, otherwise the defaults.
pub fn load_config_or_default(path: Option<&Path>) -> Result<SceneConfig, SceneError> {
    match path {
        Some(path) => load_config(path),
        None => Ok(SceneConfig::default()),
    }
}
