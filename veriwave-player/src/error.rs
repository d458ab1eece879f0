//! Error types for veriwave-player
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for the veriwave-player module
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// Audio decoding errors
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Audio output device errors
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// Playback coordination errors
    #[error("Playback error: {0}")]
    Playback(String),

    /// Analysis report parsing or envelope errors
    #[error("Analysis report error: {0}")]
    Report(String),

    /// Media duration is unknown, zero, or non-finite
    ///
    /// Segment resolution fails fast instead of guessing; the caller is
    /// responsible for deferring analysis until the duration is known.
    #[error("Media duration is unusable: {0}")]
    UnknownDuration(f64),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<veriwave_common::Error> for Error {
    fn from(err: veriwave_common::Error) -> Self {
        Error::Config(err.to_string())
    }
}

/// Convenience Result type using the veriwave-player Error
pub type Result<T> = std::result::Result<T, Error>;
