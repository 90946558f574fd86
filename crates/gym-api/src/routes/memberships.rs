//! # Memberships API
//!
//! Opening memberships behind the admission gate, listing, and
//! cancellation.

use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use chrono::Utc;
use gym_core::{CalendarDate, MemberId, MembershipId, PageRequest, PlanId, SortOrder, ValidationError};
use gym_state::{MembershipRequest, MembershipStatus};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::db::{MembershipFilter, MembershipSortField};
use crate::error::{AppError, ErrorBody};
use crate::extractors::{
    check_range, extract_validated_json, extract_validated_query, optional_date, optional_id,
    parse_path_id, parse_validated_optional_json, Validate,
};
use crate::models::MembershipRecord;
use crate::response::ApiResponse;
use crate::services;
use crate::state::AppState;

/// Request to open a membership.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateMembershipRequest {
    #[schema(format = Uuid)]
    pub member_id: Option<String>,
    #[schema(format = Uuid)]
    pub plan_id: Option<String>,
    #[schema(format = Date, example = "2024-01-01")]
    pub start_date: Option<String>,
    /// Defaults to `startDate + plan.durationDays`.
    #[schema(format = Date)]
    pub end_date: Option<String>,
}

impl Validate for CreateMembershipRequest {
    type Valid = MembershipRequest;

    fn validate(self) -> Result<MembershipRequest, ValidationError> {
        let mut errors = ValidationError::new();
        let member_id: Option<MemberId> =
            required(&mut errors, "memberId", self.member_id.as_deref())
                .and_then(|raw| optional_id(&mut errors, "memberId", Some(raw)));
        let plan_id: Option<PlanId> = required(&mut errors, "planId", self.plan_id.as_deref())
            .and_then(|raw| optional_id(&mut errors, "planId", Some(raw)));
        let start_date = required(&mut errors, "startDate", self.start_date.as_deref())
            .and_then(|raw| optional_date(&mut errors, "startDate", Some(raw)));
        let end_date = optional_date(&mut errors, "endDate", self.end_date.as_deref());

        if let (Some(start), Some(end)) = (start_date, end_date) {
            if end <= start {
                errors.push("endDate", "endDate must be after startDate", "custom");
            }
        }
        errors.into_result()?;

        match (member_id, plan_id, start_date) {
            (Some(member_id), Some(plan_id), Some(start_date)) => Ok(MembershipRequest {
                member_id,
                plan_id,
                start_date,
                end_date,
            }),
            _ => Err(ValidationError::new()),
        }
    }
}

/// Record a violation when a required field is absent or blank.
fn required<'a>(errors: &mut ValidationError, field: &str, raw: Option<&'a str>) -> Option<&'a str> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => Some(value),
        None => {
            errors.push(field, format!("{field} is required"), "invalid_type");
            None
        }
    }
}

/// Request to cancel a membership. The body may be omitted entirely.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CancelMembershipRequest {
    /// Defaults to today's date on the server clock.
    #[schema(format = Date)]
    pub cancelled_at: Option<String>,
}

impl Validate for CancelMembershipRequest {
    type Valid = Option<CalendarDate>;

    fn validate(self) -> Result<Option<CalendarDate>, ValidationError> {
        let mut errors = ValidationError::new();
        let date = optional_date(&mut errors, "cancelledAt", self.cancelled_at.as_deref());
        errors.into_result()?;
        Ok(date)
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListMembershipsQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub member_id: Option<String>,
    pub plan_id: Option<String>,
    /// `active`, `cancelled` or `expired`.
    pub status: Option<String>,
    /// Inclusive lower bound on `startDate`.
    pub start_date_from: Option<String>,
    /// Inclusive upper bound on `startDate`.
    pub start_date_to: Option<String>,
    pub sort_by: Option<MembershipSortField>,
    #[param(value_type = Option<String>, example = "desc")]
    pub sort_order: Option<SortOrder>,
}

impl Validate for ListMembershipsQuery {
    type Valid = (MembershipFilter, PageRequest);

    fn validate(self) -> Result<Self::Valid, ValidationError> {
        let mut errors = ValidationError::new();
        let page = PageRequest::new(self.page, self.page_size)
            .map_err(|e| errors.violations.extend(e.violations))
            .ok();
        let member_id = optional_id(&mut errors, "memberId", self.member_id.as_deref());
        let plan_id = optional_id(&mut errors, "planId", self.plan_id.as_deref());
        let status = match self.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => raw
                .parse::<MembershipStatus>()
                .map_err(|e| errors.push("status", e.to_string(), "invalid_enum_value"))
                .ok(),
            None => None,
        };
        let start_date_from =
            optional_date(&mut errors, "startDateFrom", self.start_date_from.as_deref());
        let start_date_to = optional_date(&mut errors, "startDateTo", self.start_date_to.as_deref());
        errors.into_result()?;

        let filter = MembershipFilter {
            member_id,
            plan_id,
            status,
            start_date_from,
            start_date_to,
            sort_by: self.sort_by.unwrap_or_default(),
            sort_order: self.sort_order.unwrap_or_default(),
        };
        Ok((filter, page.unwrap_or_default()))
    }
}

/// Build the memberships router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/memberships", get(list_memberships).post(create_membership))
        .route("/memberships/{id}", get(get_membership))
        .route("/memberships/{id}/cancel", patch(cancel_membership))
}

/// GET /api/memberships: List memberships.
#[utoipa::path(
    get,
    path = "/api/memberships",
    params(ListMembershipsQuery),
    responses(
        (status = 200, description = "One page of memberships", body = ApiResponse<Vec<MembershipRecord>>),
        (status = 400, description = "Invalid query or date range", body = ErrorBody),
    ),
    tag = "memberships"
)]
pub(crate) async fn list_memberships(
    State(state): State<AppState>,
    query: Result<Query<ListMembershipsQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<MembershipRecord>>>, AppError> {
    let (filter, page) = extract_validated_query(query)?;
    check_range(
        filter.start_date_from,
        filter.start_date_to,
        "startDateFrom",
        "startDateTo",
    )?;
    let (memberships, total) = services::memberships::list(&state.db, &filter, page).await?;
    Ok(ApiResponse::paged(
        memberships.into_iter().map(MembershipRecord::from).collect(),
        page,
        total,
    ))
}

/// POST /api/memberships: Open a membership.
#[utoipa::path(
    post,
    path = "/api/memberships",
    request_body = CreateMembershipRequest,
    responses(
        (status = 201, description = "Membership opened", body = ApiResponse<MembershipRecord>),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 403, description = "Member deleted or plan inactive", body = ErrorBody),
        (status = 404, description = "Member or plan not found", body = ErrorBody),
        (status = 409, description = "Member already has an active membership", body = ErrorBody),
    ),
    tag = "memberships"
)]
pub(crate) async fn create_membership(
    State(state): State<AppState>,
    body: Result<Json<CreateMembershipRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<MembershipRecord>>), AppError> {
    let request = extract_validated_json(body)?;
    let membership = services::memberships::create(&state.db, request, Utc::now()).await?;
    Ok(ApiResponse::created(membership.into()))
}

/// GET /api/memberships/{id}: Get a membership.
#[utoipa::path(
    get,
    path = "/api/memberships/{id}",
    params(("id" = uuid::Uuid, Path, description = "Membership ID")),
    responses(
        (status = 200, description = "Membership found", body = ApiResponse<MembershipRecord>),
        (status = 400, description = "Invalid UUID", body = ErrorBody),
        (status = 404, description = "Membership not found", body = ErrorBody),
    ),
    tag = "memberships"
)]
pub(crate) async fn get_membership(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MembershipRecord>>, AppError> {
    let id: MembershipId = parse_path_id(&id, "id")?;
    let membership = services::memberships::get(&state.db, id).await?;
    Ok(ApiResponse::ok(membership.into()))
}

/// PATCH /api/memberships/{id}/cancel: Cancel an active membership.
#[utoipa::path(
    patch,
    path = "/api/memberships/{id}/cancel",
    params(("id" = uuid::Uuid, Path, description = "Membership ID")),
    request_body(content = CancelMembershipRequest, description = "Optional; may be omitted"),
    responses(
        (status = 200, description = "Membership cancelled", body = ApiResponse<MembershipRecord>),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 404, description = "Membership not found", body = ErrorBody),
        (status = 409, description = "Membership already cancelled or expired", body = ErrorBody),
    ),
    tag = "memberships"
)]
pub(crate) async fn cancel_membership(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<ApiResponse<MembershipRecord>>, AppError> {
    let id: MembershipId = parse_path_id(&id, "id")?;
    let cancelled_at = parse_validated_optional_json::<CancelMembershipRequest>(&body)?;
    let membership =
        services::memberships::cancel(&state.db, id, cancelled_at, Utc::now()).await?;
    Ok(ApiResponse::ok(membership.into()))
}
