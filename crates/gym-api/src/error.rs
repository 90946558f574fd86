//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Every error reports a stable `ErrorCode` from `gym-core` inside the
//! failure envelope `{ success: false, error: { code, message, details? } }`.
//! Internal causes are logged and never returned to clients; in
//! development mode `middleware::dev_errors` attaches them as `stack`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gym_core::{ErrorCode, FieldViolation, ValidationError};
use gym_state::DomainError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::db::DbError;

/// Failure envelope.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Always `false`.
    pub success: bool,
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "MEMBER_NOT_FOUND").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Per-field violations, present only for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ErrorField>>,
    /// Underlying cause of an internal error, development mode only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// One invalid request field.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorField {
    pub field: String,
    pub message: String,
    pub code: String,
}

impl From<FieldViolation> for ErrorField {
    fn from(v: FieldViolation) -> Self {
        Self {
            field: v.field,
            message: v.message,
            code: v.code,
        }
    }
}

impl ErrorBody {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ErrorDetail {
                code: code.as_str().to_string(),
                message: message.into(),
                details: None,
                stack: None,
            },
        }
    }
}

/// Cause of a masked internal error, carried in response extensions so
/// the development-mode layer can surface it.
#[derive(Debug, Clone)]
pub struct InternalCause {
    pub code: ErrorCode,
    pub cause: String,
}

/// Generic message returned in place of internal error text.
pub const INTERNAL_MESSAGE: &str = "An unexpected error occurred";

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Request input failed validation (400).
    #[error("{message}")]
    Validation {
        message: String,
        details: Vec<FieldViolation>,
    },

    /// A path identifier is not a UUID (400).
    #[error("{field} must be a valid UUID")]
    InvalidUuid { field: &'static str },

    /// A `from`/`to` filter pair is inverted (400).
    #[error("{from} must be before or equal to {to}")]
    InvalidDateRange { from: &'static str, to: &'static str },

    /// No route matched the request (404).
    #[error("route {0} not found")]
    RouteNotFound(String),

    /// Lifecycle or lookup rule violation.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Storage failure (500). Message is logged but not returned to client.
    #[error("database error: {0}")]
    Database(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    pub fn status_and_code(&self) -> (StatusCode, ErrorCode) {
        let code = match self {
            Self::Validation { .. } => ErrorCode::ValidationFailed,
            Self::InvalidUuid { .. } => ErrorCode::InvalidUuid,
            Self::InvalidDateRange { .. } => ErrorCode::InvalidDateRange,
            Self::RouteNotFound(_) => ErrorCode::NotFound,
            Self::Domain(err) => err.code(),
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::Internal(_) => ErrorCode::InternalError,
        };
        let status =
            StatusCode::from_u16(code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, code)
    }

    /// Single-field validation failure.
    pub fn invalid_field(field: &str, message: impl Into<String>, code: &str) -> Self {
        let mut errors = ValidationError::new();
        errors.push(field, message, code);
        errors.into()
    }

    fn details(&self) -> Option<Vec<ErrorField>> {
        match self {
            Self::Validation { details, .. } => {
                Some(details.iter().cloned().map(ErrorField::from).collect())
            }
            Self::InvalidUuid { field } => Some(vec![ErrorField {
                field: (*field).to_string(),
                message: self.to_string(),
                code: "invalid_string".to_string(),
            }]),
            Self::InvalidDateRange { from, .. } => Some(vec![ErrorField {
                field: (*from).to_string(),
                message: self.to_string(),
                code: "custom".to_string(),
            }]),
            Self::Domain(err) => err.violation().map(|v| vec![v.into()]),
            _ => None,
        }
    }

    fn is_internal(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Internal(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if self.is_internal() {
            // Log internal errors for operator visibility.
            tracing::error!(code = %code, error = %self, "internal server error");
            let mut response =
                (status, Json(ErrorBody::new(code, INTERNAL_MESSAGE))).into_response();
            response.extensions_mut().insert(InternalCause {
                code,
                cause: self.to_string(),
            });
            return response;
        }

        let mut body = ErrorBody::new(code, self.to_string());
        body.error.details = self.details();
        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        let message = match err.violations.as_slice() {
            [only] => only.message.clone(),
            _ => "Validation failed".to_string(),
        };
        Self::Validation {
            message,
            details: err.violations,
        }
    }
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Constraint(domain) => Self::Domain(domain),
            other => Self::Database(other.to_string()),
        }
    }
}
