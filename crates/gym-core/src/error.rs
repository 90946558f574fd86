//! # Error Types and Error-Code Taxonomy
//!
//! `CoreError` covers parse and validation failures of the foundational
//! types. `ErrorCode` is the stable, machine-readable vocabulary every
//! layer reports to callers, each code carrying a fixed HTTP status.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while constructing foundational values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Text is not a hyphenated UUID.
    #[error("invalid UUID: {0:?}")]
    InvalidUuid(String),

    /// Text is not a `YYYY-MM-DD` calendar date.
    #[error("date must be in YYYY-MM-DD format, got {0:?}")]
    InvalidDate(String),

    /// Text is not an ISO-8601 timestamp with an offset.
    #[error("timestamp must be ISO-8601 with an offset, got {0:?}")]
    InvalidTimestamp(String),

    /// Day arithmetic left the representable calendar range.
    #[error("adding {days} days to {date} overflows the calendar")]
    DateOverflow { date: String, days: u32 },

    /// Email failed normalization or shape checks.
    #[error("invalid email: {0}")]
    InvalidEmail(String),

    /// Phone number failed length or character checks.
    #[error("invalid phone number: {0}")]
    InvalidPhone(String),
}

/// Broad class of an error, used for logging and status selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Conflict,
    BusinessRule,
    Internal,
}

/// Stable machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation
    ValidationFailed,
    InvalidUuid,
    InvalidDateRange,

    // Not found
    NotFound,
    MemberNotFound,
    PlanNotFound,
    MembershipNotFound,
    CheckInNotFound,

    // Conflict
    EmailAlreadyExists,
    ActiveMembershipExists,
    MembershipAlreadyCancelled,
    MembershipExpired,

    // Business rule
    MemberDeleted,
    PlanInactive,
    NoActiveMembership,

    // Internal
    InternalError,
    DatabaseError,
}

impl ErrorCode {
    /// All codes, in declaration order.
    pub const ALL: [ErrorCode; 17] = [
        Self::ValidationFailed,
        Self::InvalidUuid,
        Self::InvalidDateRange,
        Self::NotFound,
        Self::MemberNotFound,
        Self::PlanNotFound,
        Self::MembershipNotFound,
        Self::CheckInNotFound,
        Self::EmailAlreadyExists,
        Self::ActiveMembershipExists,
        Self::MembershipAlreadyCancelled,
        Self::MembershipExpired,
        Self::MemberDeleted,
        Self::PlanInactive,
        Self::NoActiveMembership,
        Self::InternalError,
        Self::DatabaseError,
    ];

    /// Wire representation of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::InvalidUuid => "INVALID_UUID",
            Self::InvalidDateRange => "INVALID_DATE_RANGE",
            Self::NotFound => "NOT_FOUND",
            Self::MemberNotFound => "MEMBER_NOT_FOUND",
            Self::PlanNotFound => "PLAN_NOT_FOUND",
            Self::MembershipNotFound => "MEMBERSHIP_NOT_FOUND",
            Self::CheckInNotFound => "CHECK_IN_NOT_FOUND",
            Self::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            Self::ActiveMembershipExists => "ACTIVE_MEMBERSHIP_EXISTS",
            Self::MembershipAlreadyCancelled => "MEMBERSHIP_ALREADY_CANCELLED",
            Self::MembershipExpired => "MEMBERSHIP_EXPIRED",
            Self::MemberDeleted => "MEMBER_DELETED",
            Self::PlanInactive => "PLAN_INACTIVE",
            Self::NoActiveMembership => "NO_ACTIVE_MEMBERSHIP",
            Self::InternalError => "INTERNAL_ERROR",
            Self::DatabaseError => "DATABASE_ERROR",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ValidationFailed | Self::InvalidUuid | Self::InvalidDateRange => {
                ErrorCategory::Validation
            }
            Self::NotFound
            | Self::MemberNotFound
            | Self::PlanNotFound
            | Self::MembershipNotFound
            | Self::CheckInNotFound => ErrorCategory::NotFound,
            Self::EmailAlreadyExists
            | Self::ActiveMembershipExists
            | Self::MembershipAlreadyCancelled
            | Self::MembershipExpired => ErrorCategory::Conflict,
            Self::MemberDeleted | Self::PlanInactive | Self::NoActiveMembership => {
                ErrorCategory::BusinessRule
            }
            Self::InternalError | Self::DatabaseError => ErrorCategory::Internal,
        }
    }

    /// HTTP status code reported for this error.
    pub fn http_status(&self) -> u16 {
        match self.category() {
            ErrorCategory::Validation => 400,
            ErrorCategory::NotFound => 404,
            ErrorCategory::Conflict => 409,
            ErrorCategory::BusinessRule => 403,
            ErrorCategory::Internal => 500,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One invalid input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Dotted path of the offending field, e.g. `endDate`.
    pub field: String,
    pub message: String,
    /// Short rule identifier, e.g. `too_big` or `invalid_string`.
    pub code: String,
}

impl FieldViolation {
    pub fn new(
        field: impl Into<String>,
        message: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            code: code.into(),
        }
    }
}

/// Accumulated field violations for one request.
///
/// Validation collects every violation before failing so callers see all
/// problems at once.
#[derive(Error, Debug, Clone, Default, PartialEq, Eq)]
#[error("validation failed: {} violation(s)", .violations.len())]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation.
    pub fn push(&mut self, field: &str, message: impl Into<String>, code: &str) {
        self.violations
            .push(FieldViolation::new(field, message, code));
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// `Ok(())` when nothing was recorded, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}
