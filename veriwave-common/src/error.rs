//! Error types shared across veriwave crates

use thiserror::Error;

/// Common error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid tuning parameter value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using the common Error
pub type Result<T> = std::result::Result<T, Error>;
