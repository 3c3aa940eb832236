//! Error types for the claudelink core library.

use thiserror::Error;

/// Result type alias using the core Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for stream handling.
#[derive(Debug, Error)]
pub enum Error {
    /// A stream line was valid JSON but not a usable event
    #[error("failed to parse stream event: {0}")]
    Parse(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
