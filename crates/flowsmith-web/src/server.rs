//! Router composition and startup.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::http::Method;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use flowsmith_agent::{ValidationSection, WorkflowService};

use crate::WebConfig;
use crate::api;
use crate::state::AppState;

/// The flowsmith HTTP server.
pub struct WebServer {
    config: WebConfig,
    state: Arc<AppState>,
}

impl WebServer {
    pub fn new(
        config: WebConfig,
        service: Arc<WorkflowService>,
        limits: ValidationSection,
    ) -> Self {
        Self {
            config,
            state: Arc::new(AppState::new(service, limits)),
        }
    }

    /// Return the `host:port` string this server will bind to.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.config.bind_addr, self.config.port)
    }

    /// The router with every route registered.
    pub fn router(&self) -> Router {
        router(Arc::clone(&self.state))
    }

    /// Bind the listener without serving yet.  Useful with port `0`.
    pub async fn bind(&self) -> std::io::Result<(TcpListener, SocketAddr)> {
        let listener = TcpListener::bind(self.addr()).await?;
        let local = listener.local_addr()?;
        Ok((listener, local))
    }

    /// Serve on an already-bound listener until the task is dropped.
    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        let router = self.router();
        axum::serve(listener, router).await
    }

    /// Bind and serve until shut down.
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP listener cannot be bound.
    pub async fn start(self) -> std::io::Result<()> {
        let (listener, local) = self.bind().await?;
        tracing::info!(addr = %local, "starting web server");
        self.serve(listener).await
    }
}

/// Build the API router over `state`.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/api/generate", post(api::generate))
        .route("/api/validate", post(api::validate))
        .route("/api/health", get(api::health))
        .route("/api/catalog", get(api::catalog))
        .layer(cors)
        .with_state(state)
}
