//! # gym-api: Axum API Service for Gym Membership Management
//!
//! REST surface over members, plans, memberships and check-ins. The
//! lifecycle rules live in `gym-state`; this crate sequences storage reads
//! around them and maps outcomes onto the response envelope.
//!
//! ## API Surface
//!
//! | Prefix                  | Module                     |
//! |-------------------------|----------------------------|
//! | `/api/members/*`        | [`routes::members`]        |
//! | `/api/plans/*`          | [`routes::plans`]          |
//! | `/api/memberships/*`    | [`routes::memberships`]    |
//! | `/api/check-ins/*`      | [`routes::check_ins`]      |
//! | `/api/health`           | [`routes::health`]         |
//! | `/health/*`             | liveness and readiness     |
//! | `/metrics`              | Prometheus scrape          |
//! | `/openapi.json`         | [`openapi`]                |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → [DevErrors] → [CORS] → Handler
//! ```
//!
//! `DevErrors` is only mounted when `APP_ENV=development`; CORS only when
//! `CORS_ORIGIN` is set.

pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;

use axum::http::{HeaderValue, Method};
use axum::middleware::{from_fn, map_response};
use axum::Router;
use tower_http::cors::{AllowHeaders, CorsLayer};

use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let mut api = Router::new()
        .nest("/api", routes::api_router())
        .merge(routes::health::probes())
        .merge(openapi::router())
        .route(
            "/metrics",
            axum::routing::get(middleware::metrics::render),
        )
        .fallback(routes::not_found);

    if let Some(cors) = cors_layer(state.config.cors_origin.as_deref()) {
        api = api.layer(cors);
    }
    if state.config.environment.is_development() {
        api = api.layer(map_response(middleware::dev_errors::attach_stack));
    }

    api.layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(middleware::tracing_layer::layer())
        .with_state(state)
}

/// CORS for a single configured origin. `None` when unset or unparseable.
fn cors_layer(origin: Option<&str>) -> Option<CorsLayer> {
    let origin = origin?;
    match HeaderValue::from_str(origin) {
        Ok(value) => Some(
            CorsLayer::new()
                .allow_origin(value)
                .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
                .allow_headers(AllowHeaders::mirror_request()),
        ),
        Err(e) => {
            tracing::warn!(origin, error = %e, "ignoring invalid CORS_ORIGIN");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_requires_valid_origin() {
        assert!(cors_layer(None).is_none());
        assert!(cors_layer(Some("http://localhost:5173")).is_some());
        assert!(cors_layer(Some("bad\norigin")).is_none());
    }
}
