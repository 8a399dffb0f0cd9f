//! TTL cache layer using [`moka`].
//!
//! Values are stored as JSON strings so one cache implementation serves any
//! `Serialize + DeserializeOwned` type.  An entry that no longer decodes is
//! evicted and reported as a miss.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::future::Cache;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, StoreError};

// ── cache stats ──────────────────────────────────────────────────────

/// Hit and miss counters.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

/// A point-in-time copy of [`CacheStats`], suitable for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub entries: u64,
}

impl CacheStats {
    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u64 {
        self.hits() + self.misses()
    }

    /// Between 0.0 and 1.0; 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.hits() as f64 / total as f64,
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hits={} misses={} rate={:.2}%",
            self.hits(),
            self.misses(),
            self.hit_rate() * 100.0,
        )
    }
}

// ── cache layer ──────────────────────────────────────────────────────

/// An async cache backed by `moka::future::Cache` with a per-entry TTL.
///
/// ```ignore
/// let cache: CacheLayer<WorkflowDocument> = CacheLayer::builder("workflows")
///     .max_capacity(1000)
///     .ttl_seconds(300)
///     .build();
/// ```
pub struct CacheLayer<T> {
    name: &'static str,
    inner: Cache<String, String>,
    stats: Arc<CacheStats>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for CacheLayer<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            inner: self.inner.clone(),
            stats: Arc::clone(&self.stats),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for CacheLayer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheLayer")
            .field("name", &self.name)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<T> CacheLayer<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn builder(name: &'static str) -> CacheLayerBuilder<T> {
        CacheLayerBuilder {
            name,
            max_capacity: 1_000,
            ttl_seconds: 300,
            _marker: PhantomData,
        }
    }

    /// Look up `key`.  Returns `None` on a miss or an undecodable entry.
    pub async fn get(&self, key: &str) -> Option<T> {
        let Some(raw) = self.inner.get(key).await else {
            self.stats.record_miss();
            debug!(cache = self.name, key, "cache miss");
            return None;
        };

        match serde_json::from_str::<T>(&raw) {
            Ok(value) => {
                self.stats.record_hit();
                debug!(cache = self.name, key, "cache hit");
                Some(value)
            }
            Err(err) => {
                warn!(cache = self.name, key, %err, "corrupt cache entry, evicting");
                self.inner.invalidate(key).await;
                self.stats.record_miss();
                None
            }
        }
    }

    pub async fn insert(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value).map_err(|e| StoreError::Encode {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.inner.insert(key.to_string(), raw).await;
        debug!(cache = self.name, key, "cache insert");
        Ok(())
    }

    #[cfg(test)]
    async fn insert_raw(&self, key: &str, raw: String) {
        self.inner.insert(key.to_string(), raw).await;
    }

    pub async fn invalidate(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
        debug!(cache = self.name, "cache cleared");
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Approximate; moka applies pending writes lazily.
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        CacheSnapshot {
            hits: self.stats.hits(),
            misses: self.stats.misses(),
            entries: self.entry_count(),
        }
    }
}

// ── builder ──────────────────────────────────────────────────────────

pub struct CacheLayerBuilder<T> {
    name: &'static str,
    max_capacity: u64,
    ttl_seconds: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> CacheLayerBuilder<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn max_capacity(mut self, cap: u64) -> Self {
        self.max_capacity = cap;
        self
    }

    pub fn ttl_seconds(mut self, secs: u64) -> Self {
        self.ttl_seconds = secs;
        self
    }

    pub fn build(self) -> CacheLayer<T> {
        let inner = Cache::builder()
            .max_capacity(self.max_capacity)
            .time_to_live(Duration::from_secs(self.ttl_seconds))
            .build();

        debug!(
            name = self.name,
            max_capacity = self.max_capacity,
            ttl_seconds = self.ttl_seconds,
            "cache layer created"
        );

        CacheLayer {
            name: self.name,
            inner,
            stats: Arc::new(CacheStats::default()),
            _marker: PhantomData,
        }
    }
}

// ── tests ────────────────────────────────────────────────────────────
