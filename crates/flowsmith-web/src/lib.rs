//! HTTP API for flowsmith.
//!
//! - `POST /api/generate`: validate a description and return a workflow.
//! - `POST /api/validate`: score a description.
//! - `GET /api/health`: liveness plus cache counters.
//! - `GET /api/catalog`: the node templates flowsmith can emit.

pub mod api;
pub mod error;
pub mod server;
pub mod state;
pub mod validation;

pub use error::ApiError;
pub use server::WebServer;
pub use state::AppState;

use flowsmith_agent::ServiceConfig;

/// Web server configuration.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// The address to bind the HTTP server to.
    pub bind_addr: String,
    /// The port to listen on.  `0` picks a free port.
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".into(),
            port: 3000,
        }
    }
}

impl From<&ServiceConfig> for WebConfig {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            bind_addr: config.server.bind.clone(),
            port: config.server.port,
        }
    }
}
