//! # Request Metrics
//!
//! HTTP counters recorded through the `metrics` facade. Without an
//! installed recorder the macros are no-ops; the binary installs the
//! Prometheus recorder and `/metrics` renders it.

use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::state::AppState;

pub const HTTP_REQUESTS_TOTAL: &str = "gym_http_requests_total";
pub const HTTP_ERRORS_TOTAL: &str = "gym_http_errors_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "gym_http_request_duration_seconds";

/// Label requests by route template rather than raw path so ids do not
/// explode label cardinality.
fn route_label(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned())
}

/// Middleware that counts requests and 4xx/5xx responses.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = route_label(&request);
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let route = [("method", method.clone()), ("path", path.clone())];
    metrics::histogram!(HTTP_REQUEST_DURATION_SECONDS, &route)
        .record(started.elapsed().as_secs_f64());

    let labels = [
        ("method", method),
        ("path", path),
        ("status", status.as_u16().to_string()),
    ];
    metrics::counter!(HTTP_REQUESTS_TOTAL, &labels).increment(1);
    if status.is_client_error() || status.is_server_error() {
        metrics::counter!(HTTP_ERRORS_TOTAL, &labels).increment(1);
    }

    response
}

/// GET /metrics: Prometheus text exposition.
///
/// 503 when the binary did not install a recorder.
pub async fn render(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [("content-type", "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed").into_response(),
    }
}
