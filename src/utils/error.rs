//! Error types for stereoplay
//!
//! This module defines the error type shared by the engine and its
//! collaborators. We use thiserror for the library error and anyhow at
//! the binary/test level.

use thiserror::Error;

/// Main error type for stereoplay
#[derive(Error, Debug)]
pub enum StereoPlayError {
    /// Media source errors (opening, reading, seeking)
    #[error("Media source error: {0}")]
    Source(String),

    /// Audio sink errors
    #[error("Audio error: {0}")]
    Audio(String),

    /// Video sink errors
    #[error("Video error: {0}")]
    Video(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Message or snapshot (de)serialization errors
    #[error("Codec error: {0}")]
    Codec(String),

    /// Unparseable textual value (stereo layout, stereo mode, ...)
    #[error("Parse error: {0}")]
    Parse(String),

    /// File I/O errors
    #[error("File error: {0}")]
    FileIO(#[from] std::io::Error),

    /// Invalid input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Requested stream does not exist
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Stereo layout not usable with the opened media
    #[error("Unsupported stereo layout: {0}")]
    UnsupportedLayout(String),

    /// A master engine is already registered
    #[error("Cannot register a second master player")]
    MasterTaken,

    /// Operation not allowed in the current engine state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Generic error for unexpected situations
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StereoPlayError {
    /// Create a media source error from string
    pub fn source_error<S: Into<String>>(msg: S) -> Self {
        StereoPlayError::Source(msg.into())
    }
}

/// Convenience type alias for Results in stereoplay
pub type Result<T> = std::result::Result<T, StereoPlayError>;

/// Extension trait for converting other errors to StereoPlayError
pub trait IntoPlayerError<T> {
    /// Convert this error into a StereoPlayError with the given context
    fn source_err(self, context: &str) -> Result<T>;
    fn audio_err(self, context: &str) -> Result<T>;
    fn video_err(self, context: &str) -> Result<T>;
    fn config_err(self, context: &str) -> Result<T>;
    fn codec_err(self, context: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> IntoPlayerError<T> for std::result::Result<T, E> {
    fn source_err(self, context: &str) -> Result<T> {
        self.map_err(|e| StereoPlayError::Source(format!("{}: {}", context, e)))
    }

    fn audio_err(self, context: &str) -> Result<T> {
        self.map_err(|e| StereoPlayError::Audio(format!("{}: {}", context, e)))
    }

    fn video_err(self, context: &str) -> Result<T> {
        self.map_err(|e| StereoPlayError::Video(format!("{}: {}", context, e)))
    }

    fn config_err(self, context: &str) -> Result<T> {
        self.map_err(|e| StereoPlayError::Config(format!("{}: {}", context, e)))
    }

    fn codec_err(self, context: &str) -> Result<T> {
        self.map_err(|e| StereoPlayError::Codec(format!("{}: {}", context, e)))
    }
}

/// Helper macro for creating internal errors with file and line information
#[macro_export]
macro_rules! internal_error {
    ($msg:expr) => {
        $crate::utils::error::StereoPlayError::Internal(
            format!("{} at {}:{}", $msg, file!(), line!())
        )
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::utils::error::StereoPlayError::Internal(
            format!("{} at {}:{}", format!($fmt, $($arg)*), file!(), line!())
        )
    };
}
