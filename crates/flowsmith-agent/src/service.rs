//! The workflow service: cache, rule pipeline, optional enhancement.
//!
//! [`WorkflowService::generate`] always returns a valid document.  The rule
//! pipeline runs first and its output is the fallback for every failure of
//! the enhancement stage.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use flowsmith_intent::QualityReport;
use flowsmith_store::{CacheSnapshot, WorkflowCache};
use flowsmith_synth::{Catalog, GenerationRequest, Synthesizer, WorkflowDocument};

use crate::config::ServiceConfig;
use crate::enhance::{Enhancer, LlmEnhancer, validate_candidate};
use crate::error::Result;
use crate::llm::LlmClient;

const DEFAULT_ENHANCE_TIMEOUT: Duration = Duration::from_secs(20);

/// The outcome of one generation.
#[derive(Debug, Clone, Serialize)]
pub struct Generation {
    pub workflow: WorkflowDocument,
    pub quality: QualityReport,
    /// Whether the document came from the cache.
    pub cached: bool,
}

#[derive(Clone)]
pub struct WorkflowService {
    synth: Arc<Synthesizer>,
    cache: WorkflowCache,
    enhancer: Option<Arc<dyn Enhancer>>,
    enhance_timeout: Duration,
}

impl std::fmt::Debug for WorkflowService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowService")
            .field("cache_enabled", &self.cache.is_enabled())
            .field("enhancer", &self.enhancer.as_ref().map(|e| e.name().to_owned()))
            .field("enhance_timeout", &self.enhance_timeout)
            .finish_non_exhaustive()
    }
}

impl WorkflowService {
    /// A service without cache or enhancement.
    pub fn new(synth: Arc<Synthesizer>) -> Self {
        Self {
            synth,
            cache: WorkflowCache::disabled(),
            enhancer: None,
            enhance_timeout: DEFAULT_ENHANCE_TIMEOUT,
        }
    }

    pub fn with_cache(mut self, cache: WorkflowCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_enhancer(mut self, enhancer: Arc<dyn Enhancer>, timeout: Duration) -> Self {
        self.enhancer = Some(enhancer);
        self.enhance_timeout = timeout;
        self
    }

    /// Build the service described by `config`.
    ///
    /// When AI is enabled but no API key is available the service runs
    /// rules-only and logs a warning.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let mut service = Self::new(Arc::new(Synthesizer::builtin()?));

        if config.cache.enabled {
            service = service.with_cache(WorkflowCache::new(
                config.cache.max_capacity,
                config.cache.ttl_seconds,
            ));
        }

        if config.ai.enabled {
            match config.ai.client_config().and_then(LlmClient::new) {
                Ok(client) => {
                    info!(
                        provider = %client.provider(),
                        model = client.model(),
                        "ai enhancement enabled"
                    );
                    service = service
                        .with_enhancer(Arc::new(LlmEnhancer::new(client)), config.ai.timeout());
                }
                Err(e) => warn!(error = %e, "ai enhancement disabled"),
            }
        }

        Ok(service)
    }

    pub fn synthesizer(&self) -> &Synthesizer {
        &self.synth
    }

    pub fn catalog(&self) -> &Catalog {
        self.synth.catalog()
    }

    pub fn cache_snapshot(&self) -> CacheSnapshot {
        self.cache.snapshot()
    }

    pub fn has_enhancer(&self) -> bool {
        self.enhancer.is_some()
    }

    /// Score a description without generating anything.
    pub fn assess(&self, description: &str) -> QualityReport {
        self.synth.extractor().assess(description)
    }

    /// Generate a workflow for `request`.
    pub async fn generate(&self, request: &GenerationRequest) -> Generation {
        let quality = self.assess(&request.description);

        if let Some(workflow) = self.cache.get(request).await {
            debug!(id = %workflow.id, "served from cache");
            return Generation {
                workflow,
                quality,
                cached: true,
            };
        }

        let baseline = self.synth.synthesize(request);
        let workflow = match &self.enhancer {
            Some(enhancer) => self.try_enhance(enhancer.as_ref(), request, baseline).await,
            None => baseline,
        };

        if let Err(e) = self.cache.put(request, &workflow).await {
            warn!(error = %e, "failed to cache workflow");
        }

        Generation {
            workflow,
            quality,
            cached: false,
        }
    }

    async fn try_enhance(
        &self,
        enhancer: &dyn Enhancer,
        request: &GenerationRequest,
        baseline: WorkflowDocument,
    ) -> WorkflowDocument {
        let attempt =
            tokio::time::timeout(self.enhance_timeout, enhancer.enhance(request, &baseline));

        let candidate = match attempt.await {
            Ok(Ok(candidate)) => candidate,
            Ok(Err(e)) => {
                warn!(enhancer = enhancer.name(), error = %e, "enhancement failed, using rules");
                return baseline;
            }
            Err(_) => {
                warn!(
                    enhancer = enhancer.name(),
                    timeout_ms = self.enhance_timeout.as_millis() as u64,
                    "enhancement timed out, using rules"
                );
                return baseline;
            }
        };

        match validate_candidate(request, &baseline, candidate) {
            Ok(enhanced) => {
                info!(
                    enhancer = enhancer.name(),
                    nodes = enhanced.nodes.len(),
                    "enhancement accepted"
                );
                enhanced
            }
            Err(e) => {
                warn!(enhancer = enhancer.name(), error = %e, "enhancement rejected, using rules");
                baseline
            }
        }
    }
}
