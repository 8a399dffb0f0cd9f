//! Shared application state for the web server.

use std::sync::Arc;

use flowsmith_agent::{ValidationSection, WorkflowService};

/// Shared state accessible from every Axum handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: Arc<WorkflowService>,

    /// Description length limits for `/api/generate`.
    pub limits: ValidationSection,
}

impl AppState {
    pub fn new(service: Arc<WorkflowService>, limits: ValidationSection) -> Self {
        Self { service, limits }
    }
}
