//! Health check handlers.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

pub(super) fn health_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(liveness_check))
        .route("/health/ready", get(readiness_check))
}

/// Run an async check with timeout; returns "healthy", "timeout", or "unhealthy: {error}".
async fn run_check<F, E>(timeout: Duration, f: F) -> String
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    match tokio::time::timeout(timeout, f).await {
        Ok(Ok(())) => "healthy".to_string(),
        Ok(Err(e)) => format!("unhealthy: {}", e),
        Err(_) => "timeout".to_string(),
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadinessResponse {
    pub status: String,
    pub storage: String,
    pub classifier: String,
}

/// Liveness probe - process is running.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Process is alive"))
)]
pub async fn liveness_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "alive" })))
}

/// Readiness probe - stores writable and classifier reachable.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "Ready to accept uploads", body = ReadinessResponse),
        (status = 503, description = "A dependency is not ready", body = ReadinessResponse)
    )
)]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let storage = run_check(CHECK_TIMEOUT, state.media.storage.health_check()).await;
    let classifier = run_check(CHECK_TIMEOUT, state.moderation.classifier.ping()).await;

    let ready = storage == "healthy" && classifier == "healthy";
    if !ready {
        tracing::warn!(storage = %storage, classifier = %classifier, "Readiness check failed");
    }

    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    // Error strings can name filesystem paths; production only reports the state.
    let redact = |check: String| {
        if state.config.is_production() && check.starts_with("unhealthy") {
            "unhealthy".to_string()
        } else {
            check
        }
    };

    (
        status_code,
        Json(ReadinessResponse {
            status: if ready { "ready" } else { "not_ready" }.to_string(),
            storage: redact(storage),
            classifier: redact(classifier),
        }),
    )
}
