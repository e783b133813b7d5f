//! Tile map and scene configuration.
//!
//! Both configs deserialize with defaults for any missing field, so a JSON
//! file only needs to name what it overrides.

use crate::Iteration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("tile grid must be at least {min}x{min} tiles, got {width}x{height}")]
    GridTooSmall { width: u32, height: u32, min: u32 },

    #[error("draw area must be non-empty, got {width}x{height}")]
    EmptyDrawArea { width: u32, height: u32 },

    #[error("{name} must be finite and positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("pixel length bounds are inverted: min {min} > max {max}")]
    InvertedBounds { min: f64, max: f64 },

    #[error("threshold must be at least 1")]
    ZeroThreshold,

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration for a single toroidal tile map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Grid width in tiles.
    pub grid_width: u32,
    /// Grid height in tiles.
    pub grid_height: u32,
    /// Plane distance covered by one tile texel.
    pub texel_length: f64,
    /// Compute threads. `None` sizes the pool from the machine.
    pub worker_threads: Option<usize>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            grid_width: 20,
            grid_height: 13,
            texel_length: 0.003,
            worker_threads: None,
        }
    }
}

/// Configuration for a scene: draw area, tile grid, and starting view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub draw_width: u32,
    pub draw_height: u32,
    pub grid_width: u32,
    pub grid_height: u32,
    /// Plane coordinates of the draw area's top-left corner.
    pub origin_x: f64,
    pub origin_y: f64,
    /// Plane distance covered by one screen pixel.
    pub pixel_length: f64,
    pub threshold: Iteration,
    /// Closest zoom. Below this f64 runs out of resolution.
    pub min_pixel_length: f64,
    /// Farthest zoom.
    pub max_pixel_length: f64,
    pub worker_threads: Option<usize>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            draw_width: 1280,
            draw_height: 720,
            grid_width: 20,
            grid_height: 13,
            origin_x: -2.4,
            origin_y: 1.075,
            pixel_length: 0.003,
            threshold: 256,
            min_pixel_length: 1e-14,
            max_pixel_length: 0.005,
            worker_threads: None,
        }
    }
}

/// Scale switching measures the grid minus one tile of slack, so two is the
/// smallest workable grid.
const MIN_GRID: u32 = 2;

fn check_positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

impl SceneConfig {
    /// Parse a config from JSON, filling unspecified fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.draw_width == 0 || self.draw_height == 0 {
            return Err(ConfigError::EmptyDrawArea {
                width: self.draw_width,
                height: self.draw_height,
            });
        }
        if self.grid_width < MIN_GRID || self.grid_height < MIN_GRID {
            return Err(ConfigError::GridTooSmall {
                width: self.grid_width,
                height: self.grid_height,
                min: MIN_GRID,
            });
        }
        check_positive("pixel_length", self.pixel_length)?;
        check_positive("min_pixel_length", self.min_pixel_length)?;
        check_positive("max_pixel_length", self.max_pixel_length)?;
        if self.min_pixel_length > self.max_pixel_length {
            return Err(ConfigError::InvertedBounds {
                min: self.min_pixel_length,
                max: self.max_pixel_length,
            });
        }
        if self.threshold == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        Ok(())
    }

    /// Config for one of the scene's tile maps, starting at one texel per
    /// screen pixel.
    pub fn map_config(&self) -> MapConfig {
        MapConfig {
            grid_width: self.grid_width,
            grid_height: self.grid_height,
            texel_length: self.pixel_length,
            worker_threads: self.worker_threads,
        }
    }
}
