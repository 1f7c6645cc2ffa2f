//! Configuration system
//!
//! Collision settings can be kept in a TOML or RON file next to the level
//! data and loaded through the [`Config`] trait.

use std::path::Path;

pub use serde::{Serialize, Deserialize};

use crate::foundation::math::{constants, Vec3};

/// On-disk configuration format, picked from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Toml,
    Ron,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path.extension().and_then(|extension| extension.to_str());
        match extension {
            Some(extension) if extension.eq_ignore_ascii_case("toml") => Ok(Self::Toml),
            Some(extension) if extension.eq_ignore_ascii_case("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Configuration trait
///
/// Files are read and written as TOML or RON depending on their extension.
/// Loaded values go through [`Config::validate`] before being returned.
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Check that the loaded values are usable
    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }

    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let contents = std::fs::read_to_string(path)?;

        let config: Self = match format {
            ConfigFormat::Toml => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?,
            ConfigFormat::Ron => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?,
            ConfigFormat::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };

        std::fs::write(path, contents)?;
        Ok(())
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value is outside of its valid range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// # Collision Configuration
///
/// Tuning values shared by the AABB tree builder and the collision
/// pipeline. The defaults match the values the engine has always shipped
/// with, so most callers never need a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Tolerance used when testing whether a vertex lies inside a half-box
    pub epsilon: f32,
    /// Depth at which the builder stops splitting and stores a leaf
    pub max_depth: usize,
    /// Direction of gravity for ground collision (need not be normalized)
    pub ground_direction: Vec3,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            epsilon: constants::EPSILON,
            max_depth: 64,
            ground_direction: Vec3::new(0.0, -1.0, 0.0),
        }
    }
}

impl Config for CollisionConfig {
    /// Check that every value is usable by the collision code
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "epsilon must be finite and non-negative, got {}",
                self.epsilon
            )));
        }
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid("max_depth must be at least 1".to_string()));
        }
        let length = self.ground_direction.norm();
        if !length.is_finite() || length <= constants::DETERMINANT_EPSILON {
            return Err(ConfigError::Invalid(
                "ground_direction must be a non-zero finite vector".to_string(),
            ));
        }
        Ok(())
    }
}
