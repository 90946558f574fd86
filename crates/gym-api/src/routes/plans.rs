//! # Plans API
//!
//! Read-only access to the plan catalog. Plans are provisioned with
//! `gym seed`.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use gym_core::{PageRequest, PlanId, SortOrder, ValidationError};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::db::{PlanFilter, PlanSortField};
use crate::error::{AppError, ErrorBody};
use crate::extractors::{extract_validated_query, parse_path_id, Validate};
use crate::models::PlanRecord;
use crate::response::ApiResponse;
use crate::routes::members::validate_search;
use crate::services;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListPlansQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// Case-insensitive substring over name and description.
    pub search: Option<String>,
    pub is_active: Option<bool>,
    pub sort_by: Option<PlanSortField>,
    #[param(value_type = Option<String>, example = "desc")]
    pub sort_order: Option<SortOrder>,
}

impl Validate for ListPlansQuery {
    type Valid = (PlanFilter, PageRequest);

    fn validate(self) -> Result<Self::Valid, ValidationError> {
        let mut errors = ValidationError::new();
        let page = PageRequest::new(self.page, self.page_size)
            .map_err(|e| errors.violations.extend(e.violations))
            .ok();
        let search = validate_search(&mut errors, self.search);
        errors.into_result()?;

        let filter = PlanFilter {
            search,
            is_active: self.is_active,
            sort_by: self.sort_by.unwrap_or_default(),
            sort_order: self.sort_order.unwrap_or_default(),
        };
        Ok((filter, page.unwrap_or_default()))
    }
}

/// Build the plans router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/plans", get(list_plans))
        .route("/plans/{id}", get(get_plan))
}

/// GET /api/plans: List plans.
#[utoipa::path(
    get,
    path = "/api/plans",
    params(ListPlansQuery),
    responses(
        (status = 200, description = "One page of plans", body = ApiResponse<Vec<PlanRecord>>),
        (status = 400, description = "Invalid query", body = ErrorBody),
    ),
    tag = "plans"
)]
pub(crate) async fn list_plans(
    State(state): State<AppState>,
    query: Result<Query<ListPlansQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<PlanRecord>>>, AppError> {
    let (filter, page) = extract_validated_query(query)?;
    let (plans, total) = services::plans::list(&state.db, &filter, page).await?;
    Ok(ApiResponse::paged(
        plans.into_iter().map(PlanRecord::from).collect(),
        page,
        total,
    ))
}

/// GET /api/plans/{id}: Get a plan.
#[utoipa::path(
    get,
    path = "/api/plans/{id}",
    params(("id" = uuid::Uuid, Path, description = "Plan ID")),
    responses(
        (status = 200, description = "Plan found", body = ApiResponse<PlanRecord>),
        (status = 400, description = "Invalid UUID", body = ErrorBody),
        (status = 404, description = "Plan not found", body = ErrorBody),
    ),
    tag = "plans"
)]
pub(crate) async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<PlanRecord>>, AppError> {
    let id: PlanId = parse_path_id(&id, "id")?;
    let plan = services::plans::get(&state.db, id).await?;
    Ok(ApiResponse::ok(plan.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_filter_passes_through() {
        let query = ListPlansQuery {
            is_active: Some(true),
            sort_by: Some(PlanSortField::PriceCents),
            sort_order: Some(SortOrder::Asc),
            ..Default::default()
        };
        let (filter, _) = query.validate().unwrap();
        assert_eq!(filter.is_active, Some(true));
        assert_eq!(filter.sort_by, PlanSortField::PriceCents);
        assert_eq!(filter.sort_order, SortOrder::Asc);
    }

    #[test]
    fn oversized_page_is_rejected() {
        let query = ListPlansQuery {
            page_size: Some(101),
            ..Default::default()
        };
        let err = query.validate().unwrap_err();
        assert_eq!(err.violations[0].field, "pageSize");
    }
}
