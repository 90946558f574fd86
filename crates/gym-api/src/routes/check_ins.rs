//! # Check-ins API
//!
//! Recording attendance behind the eligibility gate, and listing.

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use gym_core::{parse_timestamp, CheckInId, MemberId, PageRequest, SortOrder, ValidationError};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::db::{CheckInFilter, CheckInSortField};
use crate::error::{AppError, ErrorBody};
use crate::extractors::{
    check_range, extract_validated_query, optional_date, optional_id, parse_path_id,
    parse_validated_optional_json, Validate,
};
use crate::models::CheckInRecord;
use crate::response::ApiResponse;
use crate::services;
use crate::state::AppState;

/// Request to record a check-in. The body may be omitted entirely.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateCheckInRequest {
    /// ISO-8601 timestamp with offset. Defaults to the server time.
    #[schema(format = DateTime, example = "2024-01-15T10:00:00Z")]
    pub checked_in_at: Option<String>,
}

impl Validate for CreateCheckInRequest {
    type Valid = Option<DateTime<Utc>>;

    fn validate(self) -> Result<Self::Valid, ValidationError> {
        let raw = match self.checked_in_at.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok(None),
        };
        parse_timestamp(raw).map(Some).map_err(|e| {
            let mut errors = ValidationError::new();
            errors.push("checkedInAt", e.to_string(), "invalid_string");
            errors
        })
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListCheckInsQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub member_id: Option<String>,
    pub membership_id: Option<String>,
    /// From the start of this day (UTC), inclusive.
    pub date_from: Option<String>,
    /// Through the end of this day (UTC), inclusive.
    pub date_to: Option<String>,
    pub sort_by: Option<CheckInSortField>,
    #[param(value_type = Option<String>, example = "desc")]
    pub sort_order: Option<SortOrder>,
}

impl Validate for ListCheckInsQuery {
    type Valid = (CheckInFilter, PageRequest);

    fn validate(self) -> Result<Self::Valid, ValidationError> {
        let mut errors = ValidationError::new();
        let page = PageRequest::new(self.page, self.page_size)
            .map_err(|e| errors.violations.extend(e.violations))
            .ok();
        let member_id = optional_id(&mut errors, "memberId", self.member_id.as_deref());
        let membership_id =
            optional_id(&mut errors, "membershipId", self.membership_id.as_deref());
        let date_from = optional_date(&mut errors, "dateFrom", self.date_from.as_deref());
        let date_to = optional_date(&mut errors, "dateTo", self.date_to.as_deref());
        errors.into_result()?;

        let filter = CheckInFilter {
            member_id,
            membership_id,
            date_from,
            date_to,
            sort_by: self.sort_by.unwrap_or_default(),
            sort_order: self.sort_order.unwrap_or_default(),
        };
        Ok((filter, page.unwrap_or_default()))
    }
}

/// Build the check-ins router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/check-ins", get(list_check_ins))
        .route("/check-ins/{id}", get(get_check_in))
        .route("/members/{id}/check-ins", post(create_check_in))
}

/// GET /api/check-ins: List check-ins.
#[utoipa::path(
    get,
    path = "/api/check-ins",
    params(ListCheckInsQuery),
    responses(
        (status = 200, description = "One page of check-ins", body = ApiResponse<Vec<CheckInRecord>>),
        (status = 400, description = "Invalid query or date range", body = ErrorBody),
    ),
    tag = "check-ins"
)]
pub(crate) async fn list_check_ins(
    State(state): State<AppState>,
    query: Result<Query<ListCheckInsQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<CheckInRecord>>>, AppError> {
    let (filter, page) = extract_validated_query(query)?;
    check_range(filter.date_from, filter.date_to, "dateFrom", "dateTo")?;
    let (check_ins, total) = services::check_ins::list(&state.db, &filter, page).await?;
    Ok(ApiResponse::paged(
        check_ins.into_iter().map(CheckInRecord::from).collect(),
        page,
        total,
    ))
}

/// GET /api/check-ins/{id}: Get a check-in.
#[utoipa::path(
    get,
    path = "/api/check-ins/{id}",
    params(("id" = uuid::Uuid, Path, description = "Check-in ID")),
    responses(
        (status = 200, description = "Check-in found", body = ApiResponse<CheckInRecord>),
        (status = 400, description = "Invalid UUID", body = ErrorBody),
        (status = 404, description = "Check-in not found", body = ErrorBody),
    ),
    tag = "check-ins"
)]
pub(crate) async fn get_check_in(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<CheckInRecord>>, AppError> {
    let id: CheckInId = parse_path_id(&id, "id")?;
    let check_in = services::check_ins::get(&state.db, id).await?;
    Ok(ApiResponse::ok(check_in.into()))
}

/// POST /api/members/{id}/check-ins: Record a check-in.
#[utoipa::path(
    post,
    path = "/api/members/{id}/check-ins",
    params(("id" = uuid::Uuid, Path, description = "Member ID")),
    request_body(content = CreateCheckInRequest, description = "Optional; may be omitted"),
    responses(
        (status = 201, description = "Check-in recorded", body = ApiResponse<CheckInRecord>),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 403, description = "Member deleted or without active membership", body = ErrorBody),
        (status = 404, description = "Member not found", body = ErrorBody),
    ),
    tag = "check-ins"
)]
pub(crate) async fn create_check_in(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<ApiResponse<CheckInRecord>>), AppError> {
    let member_id: MemberId = parse_path_id(&member_id, "memberId")?;
    let checked_in_at = parse_validated_optional_json::<CreateCheckInRequest>(&body)?;
    let check_in =
        services::check_ins::record(&state.db, member_id, checked_in_at, Utc::now()).await?;
    Ok(ApiResponse::created(check_in.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_requires_offset() {
        let ok = CreateCheckInRequest {
            checked_in_at: Some("2024-01-15T10:00:00+02:00".into()),
        };
        assert_eq!(
            ok.validate().unwrap().unwrap().to_rfc3339(),
            "2024-01-15T08:00:00+00:00"
        );

        let naive = CreateCheckInRequest {
            checked_in_at: Some("2024-01-15T10:00:00".into()),
        };
        assert_eq!(naive.validate().unwrap_err().violations[0].field, "checkedInAt");
    }

    #[test]
    fn absent_timestamp_is_none() {
        assert_eq!(CreateCheckInRequest::default().validate().unwrap(), None);
    }

    #[test]
    fn list_query_collects_bad_ids() {
        let query = ListCheckInsQuery {
            member_id: Some("x".into()),
            membership_id: Some("y".into()),
            ..Default::default()
        };
        let err = query.validate().unwrap_err();
        assert_eq!(err.violations.len(), 2);
    }
}
