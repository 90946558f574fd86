//! Success envelope: `{ "success": true, "data": ..., "meta"?: PageMeta }`.

use axum::http::StatusCode;
use axum::Json;
use gym_core::{PageMeta, PageRequest};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Always `true`.
    pub success: bool,
    pub data: T,
    /// Present on listings: `page`, `pageSize`, `totalCount`,
    /// `totalPages`, `hasNext`, `hasPrev`.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub meta: Option<PageMeta>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
            meta: None,
        })
    }

    pub fn created(data: T) -> (StatusCode, Json<Self>) {
        (StatusCode::CREATED, Self::ok(data))
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// One page of a listing plus its metadata.
    pub fn paged(items: Vec<T>, request: PageRequest, total_count: u64) -> Json<Self> {
        Json(Self {
            success: true,
            data: items,
            meta: Some(PageMeta::new(request, total_count)),
        })
    }
}
