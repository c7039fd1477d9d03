/// Renderer configuration, loadable from TOML
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::slot::MAX_SLOTS;
use crate::viewport::Viewport;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unsupported resolution {0} (expected 240 or 480)")]
    Resolution(u32),
    #[error("{field} must be between 1 and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: usize,
        max: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Video lines: 240 (320x240) or 480 (640x480)
    pub resolution: u32,
    pub max_textures: usize,
    pub max_models: usize,
    pub matrix_stack_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resolution: 240,
            max_textures: 32,
            max_models: 32,
            matrix_stack_size: 32,
        }
    }
}

impl Config {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.resolution, 240 | 480) {
            return Err(ConfigError::Resolution(self.resolution));
        }

        let bounded = [
            ("max_textures", self.max_textures, MAX_SLOTS),
            ("max_models", self.max_models, MAX_SLOTS),
            ("matrix_stack_size", self.matrix_stack_size, 1024),
        ];
        for (field, value, max) in bounded {
            if value == 0 || value > max {
                return Err(ConfigError::OutOfRange { field, value, max });
            }
        }

        Ok(())
    }

    pub fn screen_width(&self) -> u32 {
        if self.resolution == 480 {
            640
        } else {
            320
        }
    }

    pub fn screen_height(&self) -> u32 {
        if self.resolution == 480 {
            480
        } else {
            240
        }
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.screen_width(), self.screen_height(), self.resolution)
    }
}
