//! Error types for publisher setup.

use thiserror::Error;

/// Errors that can occur while preparing or writing a publisher.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type alias for publisher operations.
pub type Result<T> = std::result::Result<T, Error>;
