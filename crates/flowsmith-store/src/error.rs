//! Error types for the flowsmith-store crate.

use thiserror::Error;

/// Alias for `Result<T, StoreError>`.
pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A value could not be encoded for the cache.
    #[error("cache encode failed for `{key}`: {reason}")]
    Encode { key: String, reason: String },
}
