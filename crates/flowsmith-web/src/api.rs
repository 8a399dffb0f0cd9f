//! REST API route handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use flowsmith_intent::QualityReport;
use flowsmith_synth::{CatalogEntry, GenerationRequest};

use crate::error::Result;
use crate::state::AppState;
use crate::validation::validate_description;

// ---------------------------------------------------------------------------
// POST /api/generate
// ---------------------------------------------------------------------------

/// Generate a workflow.  The body is a [`GenerationRequest`]:
/// `{"description", "triggerType", "complexity"}`.  The response is a
/// serialized `Generation`.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(mut request): Json<GenerationRequest>,
) -> Result<Json<Value>> {
    request.description = validate_description(&request.description, &state.limits)?;

    let generation = state.service.generate(&request).await;
    tracing::info!(
        id = %generation.workflow.id,
        cached = generation.cached,
        source = ?generation.workflow.meta.source,
        "generate request served"
    );
    Ok(Json(serde_json::to_value(&generation)?))
}

// ---------------------------------------------------------------------------
// POST /api/validate
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    #[serde(default)]
    pub description: String,
}

/// Score a description.  Never rejects on length.
pub async fn validate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ValidateRequest>,
) -> Json<QualityReport> {
    Json(state.service.assess(&body.description))
}

// ---------------------------------------------------------------------------
// GET /api/health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub cache: CacheCounters,
}

#[derive(Debug, Serialize)]
pub struct CacheCounters {
    pub hits: u64,
    pub misses: u64,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let snapshot = state.service.cache_snapshot();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        cache: CacheCounters {
            hits: snapshot.hits,
            misses: snapshot.misses,
        },
    })
}

// ---------------------------------------------------------------------------
// GET /api/catalog
// ---------------------------------------------------------------------------

pub async fn catalog(State(state): State<Arc<AppState>>) -> Json<Vec<CatalogEntry>> {
    Json(
        state
            .service
            .catalog()
            .entries()
            .iter()
            .map(|t| t.entry())
            .collect(),
    )
}
