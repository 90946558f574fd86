//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI 3.1 spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Gym Membership API",
        version = "0.1.0",
        description = "Members, plans, memberships and check-ins for a gym, with the membership lifecycle rules enforced server-side.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        // Members
        crate::routes::members::list_members,
        crate::routes::members::create_member,
        crate::routes::members::get_member_profile,
        crate::routes::members::delete_member,
        // Plans
        crate::routes::plans::list_plans,
        crate::routes::plans::get_plan,
        // Memberships
        crate::routes::memberships::list_memberships,
        crate::routes::memberships::create_membership,
        crate::routes::memberships::get_membership,
        crate::routes::memberships::cancel_membership,
        // Check-ins
        crate::routes::check_ins::list_check_ins,
        crate::routes::check_ins::get_check_in,
        crate::routes::check_ins::create_check_in,
        // Health
        crate::routes::health::health,
    ),
    components(schemas(
        // Records
        crate::models::MemberRecord,
        crate::models::PlanRecord,
        crate::models::MembershipRecord,
        crate::models::MembershipStatusView,
        crate::models::CheckInRecord,
        crate::models::MembershipWithPlan,
        crate::models::MemberProfile,
        crate::models::HealthStatus,
        // Error types
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::error::ErrorField,
        // Request DTOs
        crate::routes::members::CreateMemberRequest,
        crate::routes::memberships::CreateMembershipRequest,
        crate::routes::memberships::CancelMembershipRequest,
        crate::routes::check_ins::CreateCheckInRequest,
        // Sort fields
        crate::db::MemberSortField,
        crate::db::PlanSortField,
        crate::db::MembershipSortField,
        crate::db::CheckInSortField,
    )),
    tags(
        (name = "members", description = "Member registration, profile and soft deletion"),
        (name = "plans", description = "Plan catalog"),
        (name = "memberships", description = "Membership lifecycle"),
        (name = "check-ins", description = "Attendance"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// Serves the OpenAPI JSON spec at `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
