//! # flowsmith-store
//!
//! Result caching for flowsmith.  Generation is cheap and stateless, so the
//! cache is a pure optimisation: a lock-free `moka` TTL cache keyed by a
//! hash of the normalised request.

pub mod cache;
pub mod error;
pub mod workflow;

pub use cache::{CacheLayer, CacheLayerBuilder, CacheSnapshot, CacheStats};
pub use error::{Result, StoreError};
pub use workflow::{WorkflowCache, cache_key};
