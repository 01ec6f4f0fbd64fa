//! Configuration management for stereoplay
//!
//! This module handles loading and saving the runner configuration from
//! config files and environment variables.

use crate::media::Parameters;
use crate::utils::error::{IntoPlayerError, Result, StereoPlayError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Log levels accepted by `general.log_level`
pub const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General application settings
    pub general: GeneralConfig,

    /// Playback behaviour
    pub playback: PlaybackConfig,

    /// Persisted presentation parameters
    pub parameters: Parameters,
}

/// General application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (off, error, warn, info, debug, trace)
    pub log_level: String,
}

/// Playback configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Small seek step in seconds
    pub seek_small: u32,

    /// Medium seek step in seconds
    pub seek_medium: u32,

    /// Large seek step in seconds
    pub seek_large: u32,

    /// Display frames as fast as possible, without audio
    pub benchmark: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            seek_small: 10,
            seek_medium: 60,
            seek_large: 600,
            benchmark: false,
        }
    }
}

impl Config {
    /// Load configuration from various sources
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. Default values
    /// 2. System config file (/etc/stereoplay/config.toml on Linux)
    /// 3. User config file (~/.config/stereoplay/config.toml on Linux)
    /// 4. Environment variables (STEREOPLAY_* prefix)
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(system_path) = Self::system_config_path() {
            if system_path.exists() {
                config = Self::read_file(&system_path)?;
            }
        }

        if let Some(user_path) = Self::user_config_path() {
            if user_path.exists() {
                config = Self::read_file(&user_path)?;
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Load and validate a configuration file
    ///
    /// Keys missing from the file keep their default values.
    pub fn load_from(path: &Path) -> Result<Self> {
        let config = Self::read_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the user config file
    pub fn save(&self) -> Result<()> {
        let path = Self::user_config_path()
            .ok_or_else(|| StereoPlayError::Config("Cannot determine user config path".to_string()))?;
        self.save_to(&path)
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).config_err("Failed to create config directory")?;
        }

        let toml = toml::to_string_pretty(self).config_err("Failed to serialize config")?;
        std::fs::write(path, toml).config_err("Failed to write config file")?;

        Ok(())
    }

    fn read_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).config_err("Failed to read config file")?;
        let mut config: Config = toml::from_str(&contents).config_err("Failed to parse config file")?;
        config.parameters.sanitize();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(log_level) = std::env::var("STEREOPLAY_LOG_LEVEL") {
            self.general.log_level = log_level.to_lowercase();
        }

        if let Ok(benchmark) = std::env::var("STEREOPLAY_BENCHMARK") {
            self.playback.benchmark = match benchmark.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(StereoPlayError::Config(
                        "Invalid STEREOPLAY_BENCHMARK".to_string(),
                    ))
                }
            };
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.general.log_level.as_str()) {
            return Err(StereoPlayError::Config(format!(
                "Invalid log level '{}', must be one of: {:?}",
                self.general.log_level, LOG_LEVELS
            )));
        }

        let steps = [
            self.playback.seek_small,
            self.playback.seek_medium,
            self.playback.seek_large,
        ];
        if steps.contains(&0) {
            return Err(StereoPlayError::Config("Seek steps must be non-zero".to_string()));
        }

        Ok(())
    }

    /// Get system config file path
    fn system_config_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        return Some(PathBuf::from("/etc/stereoplay/config.toml"));

        #[cfg(target_os = "windows")]
        return std::env::var("PROGRAMDATA")
            .ok()
            .map(|p| PathBuf::from(p).join("stereoplay").join("config.toml"));

        #[cfg(target_os = "macos")]
        return Some(PathBuf::from("/Library/Application Support/stereoplay/config.toml"));

        #[allow(unreachable_code)]
        None
    }

    /// Get user config file path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("stereoplay").join("config.toml"))
    }
}
