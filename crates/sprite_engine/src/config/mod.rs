//! Configuration system
//!
//! Engine settings are plain serde structures that can be loaded from and
//! saved to TOML or RON files through the [`Config`] trait.
//!
//! ```toml
//! log_level = "debug"
//! background = 0x362d38
//!
//! [window]
//! title = "Hello"
//! width = 800
//! height = 600
//!
//! [batch]
//! capacity = 2000
//! ```

pub use serde::{Serialize, Deserialize};

use crate::render::gpu::TextureFilter;
use crate::render::batch::{DEFAULT_CAPACITY, MAX_CAPACITY};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;
        Self::from_str_with_format(&contents, path)
    }

    /// Parse configuration text, picking the format from `path`'s extension
    fn from_str_with_format(contents: &str, path: &str) -> Result<Self, ConfigError> {
        if path.ends_with(".toml") {
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
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

    /// A value is out of its allowed range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Window configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title (the canvas container id in the browser)
    pub title: String,
    /// Window width in logical pixels
    pub width: u32,
    /// Window height in logical pixels
    pub height: u32,
    /// Cover the whole primary monitor (or browser viewport)
    pub fullscreen: bool,
    /// Synchronise presentation with the display refresh
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "sprite_engine".to_string(),
            width: 1024,
            height: 640,
            fullscreen: false,
            vsync: true,
        }
    }
}

/// Sprite batch configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum sprites staged before an automatic flush
    pub capacity: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { capacity: DEFAULT_CAPACITY }
    }
}

/// Asset system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory (or URL prefix in the browser) asset paths are resolved against
    pub root: String,
    /// Sampling filter for textures uploaded from the cache
    pub filter: TextureFilter,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: "data".to_string(),
            filter: TextureFilter::Linear,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Clear colour as `0xRRGGBB`
    pub background: u32,
    /// Window configuration
    pub window: WindowConfig,
    /// Batch configuration
    pub batch: BatchConfig,
    /// Asset configuration
    pub assets: AssetConfig,
}

impl EngineConfig {
    /// Create a configuration with the given window title and size
    pub fn new(title: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            window: WindowConfig {
                title: title.into(),
                width,
                height,
                ..WindowConfig::default()
            },
            ..Self::default()
        }
    }

    /// Request a fullscreen window
    pub fn with_fullscreen(mut self, fullscreen: bool) -> Self {
        self.window.fullscreen = fullscreen;
        self
    }

    /// Set the clear colour
    pub fn with_background(mut self, rgb: u32) -> Self {
        self.background = rgb;
        self
    }

    /// Set the asset root directory
    pub fn with_asset_root(mut self, root: impl Into<String>) -> Self {
        self.assets.root = root.into();
        self
    }

    /// Set the sprite batch capacity
    pub fn with_batch_capacity(mut self, capacity: usize) -> Self {
        self.batch.capacity = capacity;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }

        if self.batch.capacity == 0 || self.batch.capacity > MAX_CAPACITY {
            return Err(ConfigError::Invalid(format!(
                "batch capacity must be within 1..={MAX_CAPACITY}, got {}",
                self.batch.capacity
            )));
        }

        if self.background > 0xff_ff_ff {
            return Err(ConfigError::Invalid(format!(
                "background must be a 24-bit colour, got {:#x}",
                self.background
            )));
        }

        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            background: 0x000000,
            window: WindowConfig::default(),
            batch: BatchConfig::default(),
            assets: AssetConfig::default(),
        }
    }
}

impl Config for EngineConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.window.width, 1024);
        assert_eq!(config.window.height, 640);
        assert_eq!(config.batch.capacity, DEFAULT_CAPACITY);
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let text = r#"
            background = 0x362d38

            [window]
            title = "Hello"
            width = 800
            height = 600
        "#;

        let config = EngineConfig::from_str_with_format(text, "hello.toml").unwrap();
        assert_eq!(config.window.title, "Hello");
        assert_eq!(config.window.width, 800);
        assert!(!config.window.fullscreen);
        assert_eq!(config.background, 0x362d38);
        assert_eq!(config.batch, BatchConfig::default());
        assert_eq!(config.assets.root, "data");
    }

    #[test]
    fn test_ron_round_trip_through_file() {
        let path = std::env::temp_dir().join("sprite_engine_config_test.ron");
        let path = path.to_str().unwrap();

        let config = EngineConfig::new("Ron", 320, 200).with_batch_capacity(64);
        config.save_to_file(path).unwrap();
        let loaded = EngineConfig::load_from_file(path).unwrap();
        std::fs::remove_file(path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unsupported_format() {
        let err = EngineConfig::from_str_with_format("", "config.json").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(EngineConfig::new("x", 0, 10).validate().is_err());
        assert!(EngineConfig::default().with_batch_capacity(0).validate().is_err());
        assert!(EngineConfig::default()
            .with_batch_capacity(MAX_CAPACITY + 1)
            .validate()
            .is_err());
        assert!(EngineConfig::default().with_background(0x1_000_000).validate().is_err());
    }
}
