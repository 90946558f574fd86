//! Health endpoints: the enveloped `/api/health` plus the bare liveness and
//! readiness probes used by orchestrators.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;

use crate::models::HealthStatus;
use crate::response::ApiResponse;
use crate::state::AppState;

/// `/api/health`, mounted inside the API router.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// `/health/liveness` and `/health/readiness`, mounted at the root.
pub fn probes() -> Router<AppState> {
    Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
}

/// GET /api/health: Service status.
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Service is up", body = ApiResponse<HealthStatus>)),
    tag = "health"
)]
pub(crate) async fn health() -> Json<ApiResponse<HealthStatus>> {
    ApiResponse::ok(HealthStatus {
        status: "ok".to_string(),
        timestamp: Utc::now(),
    })
}

/// Liveness probe: always 200 while the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 503 when the configured database is unreachable.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if let Err(e) = state.db.ping().await {
        tracing::warn!(backend = state.db.backend_name(), error = %e, "readiness check failed");
        return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
    }
    (StatusCode::OK, "ready").into_response()
}
