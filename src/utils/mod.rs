//! Utility module for stereoplay
//!
//! This module provides common utilities used throughout the crate:
//! - Error handling with custom error types
//! - Configuration management
//! - Time formatting for log output

pub mod config;
pub mod error;

// Re-export commonly used items
pub use config::{Config, GeneralConfig, PlaybackConfig};
pub use error::{IntoPlayerError, Result, StereoPlayError};

/// Load the configuration from files and environment
pub fn load_config() -> Result<Config> {
    Config::load()
}

/// Format a media time for display
///
/// # Arguments
///
/// * `micros` - Time in microseconds; negative times are shown with a sign
///
/// # Returns
///
/// Formatted string in the format "HH:MM:SS.mmm" or "MM:SS.mmm" for times under an hour
pub fn format_media_time(micros: i64) -> String {
    let sign = if micros < 0 { "-" } else { "" };
    let total_millis = micros.unsigned_abs() / 1_000;
    let millis = total_millis % 1_000;
    let total_secs = total_millis / 1_000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}{:02}:{:02}:{:02}.{:03}", sign, hours, minutes, seconds, millis)
    } else {
        format!("{}{:02}:{:02}.{:03}", sign, minutes, seconds, millis)
    }
}
