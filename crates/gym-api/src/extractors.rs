//! # Custom Extractors & Validation
//!
//! Provides the [`Validate`] trait for request DTOs and helpers to
//! extract + validate JSON bodies and query strings in handlers.
//!
//! Handlers take `Result<Json<T>, JsonRejection>` (or `Query`) rather
//! than the bare extractor so that rejections are reported in the
//! standard error envelope instead of axum's plain-text defaults.

use std::str::FromStr;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::Json;
use gym_core::{CalendarDate, ValidationError};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Request types that turn into a validated domain input.
///
/// Implementations collect every field violation before failing.
pub trait Validate {
    type Valid;

    fn validate(self) -> Result<Self::Valid, ValidationError>;
}

/// Extract a JSON body, mapping deserialization errors to `VALIDATION_FAILED`.
///
/// ```ignore
/// async fn handler(body: Result<Json<T>, JsonRejection>) -> Result<..., AppError> {
///     let req = extract_json(body)?;
/// }
/// ```
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::invalid_field("body", err.body_text(), "invalid_type"))
}

/// Extract a JSON body and validate it using the [`Validate`] trait.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T::Valid, AppError> {
    let value = extract_json(result)?;
    Ok(value.validate()?)
}

/// Parse a body that may be absent entirely.
///
/// An empty (or all-whitespace) body yields `T::default()`.
pub fn parse_optional_json<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        AppError::invalid_field(
            "body",
            format!("Failed to parse the request body as JSON: {e}"),
            "invalid_type",
        )
    })
}

/// [`parse_optional_json`] followed by [`Validate`].
pub fn parse_validated_optional_json<T: DeserializeOwned + Default + Validate>(
    body: &[u8],
) -> Result<T::Valid, AppError> {
    let value: T = parse_optional_json(body)?;
    Ok(value.validate()?)
}

/// Extract and validate a query string.
pub fn extract_validated_query<T: Validate>(
    result: Result<Query<T>, QueryRejection>,
) -> Result<T::Valid, AppError> {
    let Query(value) = result
        .map_err(|err| AppError::invalid_field("query", err.body_text(), "invalid_type"))?;
    Ok(value.validate()?)
}

/// Parse a path identifier, reporting `INVALID_UUID` on failure.
pub fn parse_path_id<T: FromStr>(raw: &str, field: &'static str) -> Result<T, AppError> {
    raw.parse().map_err(|_| AppError::InvalidUuid { field })
}

// ── Field helpers used by Validate impls ─────────────────────────────

/// Parse an optional identifier field, recording a violation on failure.
pub(crate) fn optional_id<T: FromStr>(
    errors: &mut ValidationError,
    field: &str,
    raw: Option<&str>,
) -> Option<T> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse() {
        Ok(id) => Some(id),
        Err(_) => {
            errors.push(field, format!("{field} must be a valid UUID"), "invalid_string");
            None
        }
    }
}

/// Parse an optional `YYYY-MM-DD` field, recording a violation on failure.
pub(crate) fn optional_date(
    errors: &mut ValidationError,
    field: &str,
    raw: Option<&str>,
) -> Option<CalendarDate> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    match CalendarDate::parse(raw) {
        Ok(date) => Some(date),
        Err(e) => {
            errors.push(field, e.to_string(), "invalid_date");
            None
        }
    }
}

/// Fail with `INVALID_DATE_RANGE` if `from` is after `to`.
pub(crate) fn check_range(
    from: Option<CalendarDate>,
    to: Option<CalendarDate>,
    from_field: &'static str,
    to_field: &'static str,
) -> Result<(), AppError> {
    match (from, to) {
        (Some(f), Some(t)) if f > t => Err(AppError::InvalidDateRange {
            from: from_field,
            to: to_field,
        }),
        _ => Ok(()),
    }
}
