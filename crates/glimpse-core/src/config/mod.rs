//! Configuration management for Glimpse.
//!
//! Configuration is loaded from the platform config directory
//! (`~/.config/glimpse/config.toml` on Linux). Every section falls back to
//! its defaults, so a missing file or a partial one is fine.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use crate::hash::HashParams;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Glimpse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hash sizing
    pub hash: HashParams,

    /// Input file settings
    pub processing: ProcessingConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.glimpse.glimpse/config.toml
    /// - Linux: ~/.config/glimpse/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\glimpse\glimpse\config\config.toml
    ///
    /// Falls back to ~/.glimpse/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "glimpse", "glimpse")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".glimpse").join("config.toml")
            })
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.hash.thumb_size, 16);
        assert_eq!(config.hash.hash_size, 32);
        assert_eq!(config.limits.max_file_size_mb, 100);
        assert_eq!(config.output.format, "json");
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[hash]"));
        assert!(toml.contains("[limits]"));
        assert!(toml.contains("thumb_size = 16"));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = Config::default();
        let parsed = Config::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed.hash, config.hash);
        assert_eq!(
            parsed.processing.supported_formats,
            config.processing.supported_formats
        );
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml("[hash]\nthumb_size = 8\n").unwrap();
        assert_eq!(config.hash.thumb_size, 8);
        assert_eq!(config.hash.hash_size, 32);
        assert_eq!(config.limits.decode_timeout_ms, 5000);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[output]\nformat = \"jsonl\"\npretty = true\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.output.format, "jsonl");
        assert!(config.output.pretty);
    }

    #[test]
    fn test_load_from_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[hash\nthumb_size = ").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError(_)));
    }

    #[test]
    fn test_supported_extension() {
        let processing = ProcessingConfig::default();
        assert!(processing.is_supported_extension("jpg"));
        assert!(processing.is_supported_extension("PNG"));
        assert!(!processing.is_supported_extension("txt"));
    }
}
