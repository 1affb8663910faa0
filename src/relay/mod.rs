//! HTTP relay exposing paper insights generation to browsers.
//!
//! Routes:
//! - `POST /api/paper/{id}/insights`: forwards to the search backend
//! - `GET /health`: liveness check

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::backend::{BackendError, SearchBackend};
use crate::config::RelayConfig;
use crate::models::InsightsResponse;

#[derive(Debug, Clone)]
struct AppState {
    backend: Arc<dyn SearchBackend>,
}

/// Failure of a relayed request, rendered as a JSON error body
#[derive(Debug)]
pub enum RelayError {
    /// The backend answered with a non-success status
    Upstream(StatusCode),
    /// Anything else
    Internal,
}

impl From<BackendError> for RelayError {
    fn from(err: BackendError) -> Self {
        match err.status() {
            Some(status) => RelayError::Upstream(status),
            None => RelayError::Internal,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match self {
            RelayError::Upstream(status) => (
                status,
                Json(json!({ "error": "Failed to generate insights" })),
            )
                .into_response(),
            RelayError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response(),
        }
    }
}

/// Build the relay router
pub fn router(backend: Arc<dyn SearchBackend>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/paper/{id}/insights", post(insights_handler))
        .with_state(AppState { backend })
}

/// Bind to the configured address and serve until Ctrl-C
pub async fn serve(config: &RelayConfig, backend: Arc<dyn SearchBackend>) -> std::io::Result<()> {
    let listener = TcpListener::bind(&config.bind).await?;
    tracing::info!("Insights relay listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(backend))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

/// Serve on an already bound listener until the task is dropped
pub async fn serve_listener(
    listener: TcpListener,
    backend: Arc<dyn SearchBackend>,
) -> std::io::Result<()> {
    axum::serve(listener, router(backend)).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down insights relay");
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn insights_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<InsightsResponse>, RelayError> {
    tracing::info!("Insights requested for paper {}", id);

    match state.backend.generate_insights(&id).await {
        Ok(insights) => Ok(Json(insights)),
        Err(e) => {
            tracing::error!("Insights for paper {} failed: {}", id, e);
            Err(e.into())
        }
    }
}
