//! Editor configuration.
//!
//! Loaded from a JSON document; every field is optional and falls back to its
//! default, so `{}` is a valid configuration.

use crate::input::DoubleClickConfig;
use crate::placement::PlacementConfig;
use crate::routing::RoutingConfig;
use crate::snap::{GRID_SIZE, MIN_GRID_SIZE};
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors from loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub routing: RoutingConfig,
    pub placement: PlacementConfig,
    pub double_click: DoubleClickConfig,
    pub grid_size: f64,
    pub node_width: f64,
    pub node_height: f64,
    /// Hit radius around a label anchor, in canvas units.
    pub label_hit_radius: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            routing: RoutingConfig::default(),
            placement: PlacementConfig::default(),
            double_click: DoubleClickConfig::default(),
            grid_size: GRID_SIZE,
            node_width: 140.0,
            node_height: 56.0,
            label_hit_radius: 16.0,
        }
    }
}

impl EditorConfig {
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded editor config from {}", path.display());
        Ok(config)
    }

    pub fn node_size(&self) -> Size {
        Size::new(self.node_width, self.node_height)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.node_width <= 0.0 || self.node_height <= 0.0 {
            return Err(ConfigError::Invalid("node size must be positive".into()));
        }
        if self.placement.idle_timeout_ms > self.placement.max_timeout_ms {
            return Err(ConfigError::Invalid(
                "idle timeout exceeds max timeout".into(),
            ));
        }
        if self.grid_size != 0.0 && self.grid_size < MIN_GRID_SIZE {
            return Err(ConfigError::Invalid(format!(
                "grid size must be 0 or at least {}",
                MIN_GRID_SIZE
            )));
        }
        Ok(())
    }
}
