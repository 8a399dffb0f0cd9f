//! Synthesis error types.
//!
//! Synthesis never fails for any description.  The variants below cover
//! one-time construction and serialization only.

/// Unified error type for the synthesis crate.
#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    /// Compiling the keyword configuration failed.
    #[error("intent error: {0}")]
    Intent(#[from] flowsmith_intent::IntentError),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the synthesis crate.
pub type Result<T> = std::result::Result<T, SynthError>;
