//! # Domain Errors
//!
//! Every not-found, conflict and business-rule outcome of the lifecycle
//! engine. Each variant maps to exactly one stable `ErrorCode`.

use gym_core::{
    CalendarDate, CheckInId, CoreError, ErrorCode, FieldViolation, MemberId, MembershipId, PlanId,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("member {0} not found")]
    MemberNotFound(MemberId),

    #[error("member {0} has been deleted")]
    MemberDeleted(MemberId),

    #[error("plan {0} not found")]
    PlanNotFound(PlanId),

    #[error("plan {0} is not active")]
    PlanInactive(PlanId),

    #[error("member {0} already has an active membership")]
    ActiveMembershipExists(MemberId),

    #[error("membership {0} not found")]
    MembershipNotFound(MembershipId),

    #[error("membership {0} is already cancelled")]
    MembershipAlreadyCancelled(MembershipId),

    #[error("membership {0} has expired")]
    MembershipExpired(MembershipId),

    #[error("member {0} has no active membership")]
    NoActiveMembership(MemberId),

    #[error("check-in {0} not found")]
    CheckInNotFound(CheckInId),

    #[error("email {0} already exists")]
    EmailAlreadyExists(String),

    /// Membership window is empty or inverted.
    #[error("endDate {end} must be after startDate {start}")]
    InvalidWindow {
        start: CalendarDate,
        end: CalendarDate,
    },

    /// End-date derivation left the calendar range.
    #[error("cannot derive end date: {0}")]
    DateOverflow(CoreError),
}

impl DomainError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MemberNotFound(_) => ErrorCode::MemberNotFound,
            Self::MemberDeleted(_) => ErrorCode::MemberDeleted,
            Self::PlanNotFound(_) => ErrorCode::PlanNotFound,
            Self::PlanInactive(_) => ErrorCode::PlanInactive,
            Self::ActiveMembershipExists(_) => ErrorCode::ActiveMembershipExists,
            Self::MembershipNotFound(_) => ErrorCode::MembershipNotFound,
            Self::MembershipAlreadyCancelled(_) => ErrorCode::MembershipAlreadyCancelled,
            Self::MembershipExpired(_) => ErrorCode::MembershipExpired,
            Self::NoActiveMembership(_) => ErrorCode::NoActiveMembership,
            Self::CheckInNotFound(_) => ErrorCode::CheckInNotFound,
            Self::EmailAlreadyExists(_) => ErrorCode::EmailAlreadyExists,
            Self::InvalidWindow { .. } | Self::DateOverflow(_) => ErrorCode::ValidationFailed,
        }
    }

    /// Field-level detail for errors that stem from request input.
    pub fn violation(&self) -> Option<FieldViolation> {
        match self {
            Self::InvalidWindow { .. } => Some(FieldViolation::new(
                "endDate",
                "endDate must be after startDate",
                "custom",
            )),
            Self::DateOverflow(_) => Some(FieldViolation::new(
                "startDate",
                self.to_string(),
                "invalid_date",
            )),
            _ => None,
        }
    }
}
