//! Error types for the store crate.

use thiserror::Error;

/// Result type alias using the store error type.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors from record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage medium could not be read or written.
    #[error("storage unavailable: {0}")]
    Storage(#[from] std::io::Error),

    /// A record or the store payload failed to serialize.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
