//! # API Route Modules
//!
//! Each module exposes a `router()` whose paths are relative to `/api`.
//!
//! | Path                                | Module          |
//! |-------------------------------------|-----------------|
//! | `/api/members/*`                    | [`members`]     |
//! | `/api/plans/*`                      | [`plans`]       |
//! | `/api/memberships/*`                | [`memberships`] |
//! | `/api/check-ins/*`, `/api/members/{id}/check-ins` | [`check_ins`] |
//! | `/api/health`                       | [`health`]      |

pub mod check_ins;
pub mod health;
pub mod members;
pub mod memberships;
pub mod plans;

use axum::http::Uri;
use axum::Router;

use crate::error::AppError;
use crate::state::AppState;

/// All `/api` routes, relative to the prefix.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(members::router())
        .merge(plans::router())
        .merge(memberships::router())
        .merge(check_ins::router())
        .merge(health::router())
}

/// Fallback for unmatched paths: `NOT_FOUND` in the error envelope.
pub async fn not_found(uri: Uri) -> AppError {
    AppError::RouteNotFound(uri.path().to_string())
}
