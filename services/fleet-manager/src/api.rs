//! HTTP surface for the destroy workflow.
//!
//! - `POST /destroy`: body is a `VmCleanupRequest`; 200 on success, 400 for
//!   malformed requests, 500 for every other failure.
//! - `GET /health`: liveness check.
//! - `GET /metrics`: Prometheus text exposition.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use fleet_common::VmCleanupRequest;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::application::services::DestroyService;
use crate::domain::DestroyError;
use crate::infra::MetricsRegistry;

#[derive(Clone)]
pub struct AppState {
    pub destroy: DestroyService,
    pub metrics: Arc<MetricsRegistry>,
    /// Fired on server shutdown; interrupts destroy retries that are waiting.
    pub shutdown: CancellationToken,
}

impl AppState {
    #[must_use]
    pub fn new(destroy: DestroyService, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            destroy,
            metrics,
            shutdown: CancellationToken::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DestroyResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/destroy", post(destroy_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

async fn destroy_handler(
    State(state): State<AppState>,
    Json(req): Json<VmCleanupRequest>,
) -> Response {
    let cancel = state.shutdown.child_token();
    match state.destroy.handle_destroy(&req, &cancel).await {
        Ok(()) => (
            StatusCode::OK,
            Json(DestroyResponse {
                status: "destroyed".to_string(),
            }),
        )
            .into_response(),
        Err(err) => {
            let status = status_for(&err);
            if status.is_server_error() {
                tracing::error!(
                    stage_runtime_id = %req.stage_runtime_id,
                    error = %format!("{err:#}"),
                    "destroy request failed",
                );
            }
            (
                status,
                Json(ErrorResponse {
                    error: format!("{err:#}"),
                }),
            )
                .into_response()
        }
    }
}

fn status_for(err: &anyhow::Error) -> StatusCode {
    match err.downcast_ref::<DestroyError>() {
        Some(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn health_handler() -> StatusCode {
    StatusCode::OK
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.metrics.encode_text() {
        Ok(text) => (
            StatusCode::OK,
            [(CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}
