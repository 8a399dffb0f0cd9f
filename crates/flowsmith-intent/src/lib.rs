//! Intent extraction for flowsmith.
//!
//! This crate turns a free-text automation description into a structured
//! [`Intent`]: the set of services the text mentions, a coarse workflow-type
//! classification, and whether the text asks for conditional logic.
//!
//! - **Keyword configuration**: the immutable dictionaries driving every
//!   match, built once via [`KeywordConfig::builtin`] and shared.
//! - **Extraction**: multi-pattern matching with word boundaries via
//!   [`IntentExtractor`].  Extraction is pure and never fails.
//! - **Quality scoring**: a point-based heuristic describing how complete a
//!   description is, via [`IntentExtractor::assess`].

pub mod error;
pub mod extractor;
pub mod keywords;
pub mod quality;

pub use error::{IntentError, Result};
pub use extractor::{Intent, IntentExtractor};
pub use keywords::{KeywordConfig, ServiceTag, WeightedKeyword, WorkflowType};
pub use quality::{QualityLevel, QualityReport};
