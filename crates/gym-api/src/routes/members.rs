//! # Members API
//!
//! Registration, listing with search, the profile aggregate, and soft
//! deletion.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use gym_core::{MemberId, PageRequest, SortOrder, ValidationError};
use gym_state::MemberRegistration;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::db::{MemberFilter, MemberSortField};
use crate::error::{AppError, ErrorBody};
use crate::extractors::{
    extract_validated_json, extract_validated_query, parse_path_id, Validate,
};
use crate::models::{MemberProfile, MemberRecord};
use crate::response::ApiResponse;
use crate::services;
use crate::state::AppState;

/// Maximum length of the free-text `search` filter.
pub const MAX_SEARCH_LEN: usize = 100;

/// Request to register a member.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateMemberRequest {
    #[schema(example = "Ada")]
    pub first_name: String,
    #[schema(example = "Lovelace")]
    pub last_name: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    pub phone: Option<String>,
}

impl Validate for CreateMemberRequest {
    type Valid = MemberRegistration;

    /// Field rules are enforced by `MemberRegistration::into_member`, which
    /// reports every violation at once.
    fn validate(self) -> Result<MemberRegistration, ValidationError> {
        Ok(MemberRegistration {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
        })
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListMembersQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// Case-insensitive substring over first name, last name and email.
    pub search: Option<String>,
    /// Include soft-deleted members (default `false`).
    pub include_deleted: Option<bool>,
    pub sort_by: Option<MemberSortField>,
    #[param(value_type = Option<String>, example = "desc")]
    pub sort_order: Option<SortOrder>,
}

impl Validate for ListMembersQuery {
    type Valid = (MemberFilter, PageRequest);

    fn validate(self) -> Result<Self::Valid, ValidationError> {
        let mut errors = ValidationError::new();
        let page = PageRequest::new(self.page, self.page_size)
            .map_err(|e| errors.violations.extend(e.violations))
            .ok();
        let search = validate_search(&mut errors, self.search);
        errors.into_result()?;

        let filter = MemberFilter {
            search,
            include_deleted: self.include_deleted.unwrap_or(false),
            sort_by: self.sort_by.unwrap_or_default(),
            sort_order: self.sort_order.unwrap_or_default(),
        };
        Ok((filter, page.unwrap_or_default()))
    }
}

/// Trim a search term; blank means no filter.
pub(crate) fn validate_search(
    errors: &mut ValidationError,
    search: Option<String>,
) -> Option<String> {
    let search = search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())?;
    if search.chars().count() > MAX_SEARCH_LEN {
        errors.push(
            "search",
            format!("search must be at most {MAX_SEARCH_LEN} characters"),
            "too_big",
        );
        return None;
    }
    Some(search)
}

/// Build the members router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/members", get(list_members).post(create_member))
        .route("/members/{id}", get(get_member_profile).delete(delete_member))
}

/// GET /api/members: List members.
#[utoipa::path(
    get,
    path = "/api/members",
    params(ListMembersQuery),
    responses(
        (status = 200, description = "One page of members", body = ApiResponse<Vec<MemberRecord>>),
        (status = 400, description = "Invalid query", body = ErrorBody),
    ),
    tag = "members"
)]
pub(crate) async fn list_members(
    State(state): State<AppState>,
    query: Result<Query<ListMembersQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<MemberRecord>>>, AppError> {
    let (filter, page) = extract_validated_query(query)?;
    let (members, total) = services::members::list(&state.db, &filter, page).await?;
    Ok(ApiResponse::paged(
        members.into_iter().map(MemberRecord::from).collect(),
        page,
        total,
    ))
}

/// POST /api/members: Register a member.
#[utoipa::path(
    post,
    path = "/api/members",
    request_body = CreateMemberRequest,
    responses(
        (status = 201, description = "Member registered", body = ApiResponse<MemberRecord>),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 409, description = "Email already exists", body = ErrorBody),
    ),
    tag = "members"
)]
pub(crate) async fn create_member(
    State(state): State<AppState>,
    body: Result<Json<CreateMemberRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<MemberRecord>>), AppError> {
    let registration = extract_validated_json(body)?;
    let member = services::members::register(&state.db, registration, Utc::now()).await?;
    Ok(ApiResponse::created(member.into()))
}

/// GET /api/members/{id}: Member profile aggregate.
#[utoipa::path(
    get,
    path = "/api/members/{id}",
    params(("id" = uuid::Uuid, Path, description = "Member ID")),
    responses(
        (status = 200, description = "Member profile", body = ApiResponse<MemberProfile>),
        (status = 400, description = "Invalid UUID", body = ErrorBody),
        (status = 403, description = "Member has been deleted", body = ErrorBody),
        (status = 404, description = "Member not found", body = ErrorBody),
    ),
    tag = "members"
)]
pub(crate) async fn get_member_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MemberProfile>>, AppError> {
    let id: MemberId = parse_path_id(&id, "id")?;
    let profile = services::members::profile(&state.db, id, Utc::now()).await?;
    Ok(ApiResponse::ok(profile))
}

/// DELETE /api/members/{id}: Soft-delete a member.
#[utoipa::path(
    delete,
    path = "/api/members/{id}",
    params(("id" = uuid::Uuid, Path, description = "Member ID")),
    responses(
        (status = 200, description = "Member soft-deleted", body = ApiResponse<MemberRecord>),
        (status = 403, description = "Member already deleted", body = ErrorBody),
        (status = 404, description = "Member not found", body = ErrorBody),
    ),
    tag = "members"
)]
pub(crate) async fn delete_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MemberRecord>>, AppError> {
    let id: MemberId = parse_path_id(&id, "id")?;
    let member = services::members::soft_delete(&state.db, id, Utc::now()).await?;
    Ok(ApiResponse::ok(member.into()))
}
