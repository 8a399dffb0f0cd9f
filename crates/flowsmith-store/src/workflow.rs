//! The generated-workflow cache.
//!
//! Keys are the SHA-256 of the normalised request, so requests that differ
//! only in case or surrounding whitespace share an entry.  A disabled cache
//! stores nothing and reports every lookup as a miss.

use flowsmith_synth::{GenerationRequest, WorkflowDocument, sha256_hex};
use tracing::info;

use crate::cache::{CacheLayer, CacheSnapshot};
use crate::error::Result;

/// Cache key for a request.
///
/// The description is trimmed, lower-cased and whitespace-collapsed; a
/// missing trigger hashes as `auto`.
pub fn cache_key(request: &GenerationRequest) -> String {
    let description = request
        .description
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let trigger = request
        .trigger_type
        .map_or("auto", |t| t.as_str());
    let normalised = format!("{description}\n{trigger}\n{}", request.complexity);
    sha256_hex(normalised.as_bytes())
}

#[derive(Debug, Clone)]
pub struct WorkflowCache {
    layer: Option<CacheLayer<WorkflowDocument>>,
}

impl WorkflowCache {
    pub fn new(max_capacity: u64, ttl_seconds: u64) -> Self {
        info!(max_capacity, ttl_seconds, "workflow cache enabled");
        Self {
            layer: Some(
                CacheLayer::builder("workflows")
                    .max_capacity(max_capacity)
                    .ttl_seconds(ttl_seconds)
                    .build(),
            ),
        }
    }

    pub fn disabled() -> Self {
        Self { layer: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.layer.is_some()
    }

    pub async fn get(&self, request: &GenerationRequest) -> Option<WorkflowDocument> {
        let layer = self.layer.as_ref()?;
        layer.get(&cache_key(request)).await
    }

    pub async fn put(&self, request: &GenerationRequest, doc: &WorkflowDocument) -> Result<()> {
        match &self.layer {
            Some(layer) => layer.insert(&cache_key(request), doc).await,
            None => Ok(()),
        }
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        self.layer
            .as_ref()
            .map(CacheLayer::snapshot)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, Utc};
    use flowsmith_synth::{Complexity, FixedSource, Synthesizer, TriggerKind};

    use super::*;

    fn request(description: &str) -> GenerationRequest {
        GenerationRequest::new(description, TriggerKind::Webhook, Complexity::Medium)
    }

    #[test]
    fn key_normalises_description() {
        assert_eq!(
            cache_key(&request("Send  Slack message ")),
            cache_key(&request("send slack message"))
        );
        assert_eq!(cache_key(&request("x")).len(), 64);
    }

    #[test]
    fn key_depends_on_trigger_and_complexity() {
        let base = request("send slack message");
        let mut other = base.clone();
        other.complexity = Complexity::Complex;
        assert_ne!(cache_key(&base), cache_key(&other));

        let mut auto = base.clone();
        auto.trigger_type = None;
        assert_ne!(cache_key(&base), cache_key(&auto));
    }

    #[tokio::test]
    async fn cached_document_is_returned_unchanged() {
        let synth = Synthesizer::with_uniqueness(Arc::new(FixedSource::new(
            DateTime::<Utc>::UNIX_EPOCH,
        )))
        .unwrap();
        let req = request("Send a Slack message when a new lead is added to Google Sheets");
        let doc = synth.synthesize(&req);

        let cache = WorkflowCache::new(10, 60);
        assert!(cache.get(&req).await.is_none());
        cache.put(&req, &doc).await.unwrap();
        assert_eq!(cache.get(&req).await, Some(doc));

        let snap = cache.snapshot();
        assert_eq!((snap.hits, snap.misses), (1, 1));
    }

    #[tokio::test]
    async fn disabled_cache_stores_nothing() {
        let cache = WorkflowCache::disabled();
        let req = request("anything");
        let doc = Synthesizer::builtin().unwrap().synthesize(&req);
        cache.put(&req, &doc).await.unwrap();
        assert!(cache.get(&req).await.is_none());
        assert_eq!(cache.snapshot(), CacheSnapshot::default());
        assert!(!cache.is_enabled());
    }
}
