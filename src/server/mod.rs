//! HTTP API for pm-agent.
//!
//! Stateless JSON endpoints, one per task adapter:
//!
//! - `GET /` - liveness message
//! - `GET /health` - plain health check
//! - `POST /api/groom` - groom one backlog item
//! - `POST /api/cluster-feedback` - cluster feedback into themes
//! - `POST /api/roadmap` - plan a weekly roadmap
//!
//! Adapter failures become a 500 whose body keeps the error kind.

mod handlers;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::agents::Agents;
use crate::ai::AgentError;
use crate::core::ServerConfig;

/// Route paths.
pub mod routes {
    /// Route: GET /
    pub const ROOT: &str = "/";

    /// Route: GET /health
    pub const HEALTH: &str = "/health";

    /// Route: POST /api/groom
    pub const GROOM: &str = "/api/groom";

    /// Route: POST /api/cluster-feedback
    pub const CLUSTER_FEEDBACK: &str = "/api/cluster-feedback";

    /// Route: POST /api/roadmap
    pub const ROADMAP: &str = "/api/roadmap";
}

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub agents: Agents,
}

impl AppState {
    pub fn new(agents: Agents) -> Self {
        Self { agents }
    }
}

/// API error types.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("{message}")]
    BadRequest { status: StatusCode, message: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Agent(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest { status, .. } => *status,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Agent(e) => e.kind(),
            Self::BadRequest { .. } => "invalid_request",
        }
    }
}

/// JSON body returned for every failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
    pub kind: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { detail: self.to_string(), kind: self.kind().to_string() };
        (self.status(), Json(body)).into_response()
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Build the router with all routes and layers.
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    let app = Router::new()
        .route(routes::ROOT, get(handlers::root))
        .route(routes::HEALTH, get(handlers::health))
        .route(routes::GROOM, post(handlers::groom))
        .route(routes::CLUSTER_FEEDBACK, post(handlers::cluster_feedback))
        .route(routes::ROADMAP, post(handlers::roadmap))
        .layer(TraceLayer::new_for_http());

    let app = if config.cors { app.layer(CorsLayer::permissive()) } else { app };
    app.with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: &ServerConfig, state: AppState) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "pm-agent API listening");

    axum::serve(listener, router(state, config)).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
