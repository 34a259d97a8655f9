//! Error types for the quote analytics pipeline.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the quote analytics pipeline.
///
/// Row-level problems (malformed rows, rejected quotes, unknown chains) never
/// surface here; they are dropped or defaulted where they occur. Only failures
/// that make a whole input unusable become an `Error`.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data error (structurally broken input).
    #[error("Data error: {0}")]
    Data(String),

    /// Input source error (a source exists but could not be read).
    #[error("Input error: {0}")]
    Input(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a data error.
    pub fn data(msg: impl Into<String>) -> Self {
        Error::Data(msg.into())
    }

    /// Create an input source error.
    pub fn input(msg: impl Into<String>) -> Self {
        Error::Input(msg.into())
    }
}
