//! Intent extraction error types.
//!
//! Extraction itself never fails; errors only surface while compiling the
//! keyword configuration into matchers.

/// Unified error type for the intent crate.
#[derive(Debug, thiserror::Error)]
pub enum IntentError {
    /// Building a multi-pattern automaton failed.
    #[error("keyword matcher build error: {reason}")]
    MatcherBuild { reason: String },

    /// A regex pattern in the keyword configuration is invalid.
    #[error("invalid regex pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The keyword configuration is structurally unusable.
    #[error("invalid keyword configuration: {reason}")]
    InvalidConfig { reason: String },
}

/// Convenience alias used throughout the intent crate.
pub type Result<T> = std::result::Result<T, IntentError>;
