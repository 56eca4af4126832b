//! HTTP API Server for ldsync
//!
//! `POST /api/events` takes a JSON object of header names to values, runs the
//! pipeline for it and answers with the `SyncResult`.

use crate::{
    core::SyncResult, error::SyncError, events::normalizer::normalize,
    pipeline::SyncPipeline, registry::IdentifierLocks,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::{collections::HashMap, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Generic success response
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub stage: String,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_status: Option<u16>,
}

/// Shared application state
pub struct AppState {
    pub pipeline: Arc<SyncPipeline>,
    pub locks: IdentifierLocks,
}

/// Custom error type for API errors
pub struct ApiError(SyncError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = match &err {
            SyncError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            e if e.is_retryable() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::BAD_REQUEST,
        };

        let body = Json(ErrorResponse {
            error: err.to_string(),
            stage: err.stage().to_string(),
            retryable: err.is_retryable(),
            upstream_status: err.status(),
        });
        (status, body).into_response()
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        ApiError(err)
    }
}

/// Create the HTTP server with all routes
pub fn create_server(pipeline: Arc<SyncPipeline>) -> Router {
    let state = Arc::new(AppState { pipeline, locks: IdentifierLocks::new() });

    // Configure CORS
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/api/events", post(submit_event))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(SuccessResponse { message: "ldsync HTTP API is running".to_string() })
}

/// POST /api/events - Synchronize one changed resource
async fn submit_event(
    State(state): State<Arc<AppState>>,
    Json(headers): Json<HashMap<String, String>>,
) -> Result<Json<SyncResult>, ApiError> {
    let event = normalize(&headers)?;

    let _guard = state.locks.acquire(&event.subject_uri()).await;
    let result = state.pipeline.synchronize(&event).await?;

    Ok(Json(result))
}

/// Start the HTTP server on the specified address
pub async fn start_server(
    addr: &str,
    pipeline: Arc<SyncPipeline>,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_server(pipeline);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, "ldsync HTTP API listening");
    info!("  POST   /api/events   - Synchronize a changed resource");
    info!("  GET    /health       - Health check");

    axum::serve(listener, app).await?;

    Ok(())
}
