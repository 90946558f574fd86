//! # Membership Lifecycle State Machine
//!
//! A membership binds one member to one plan for a calendar window
//! `[start_date, end_date]`.
//!
//! ## States
//!
//! ```text
//! Active ──▶ Cancelled (terminal)
//!    │
//!    └────▶ Expired   (terminal)
//! ```
//!
//! A membership is created `Active` and never returns to `Active`. The
//! `Expired` transition is only taken by the explicit expiry sweep; reads
//! never change status.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use gym_core::{CalendarDate, MemberId, MembershipId, PlanId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::DomainError;
use crate::member::Member;
use crate::plan::Plan;

// ─── Membership Status ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    Active,
    Cancelled,
    Expired,
}

impl MembershipStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Expired)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored status text that names no known state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown membership status {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for MembershipStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "cancelled" => Ok(Self::Cancelled),
            "expired" => Ok(Self::Expired),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

// ─── Membership ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub id: MembershipId,
    pub member_id: MemberId,
    pub plan_id: PlanId,
    pub start_date: CalendarDate,
    pub end_date: CalendarDate,
    pub cancelled_at: Option<CalendarDate>,
    pub status: MembershipStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for opening a membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MembershipRequest {
    pub member_id: MemberId,
    pub plan_id: PlanId,
    pub start_date: CalendarDate,
    /// Derived from the plan duration when absent.
    pub end_date: Option<CalendarDate>,
}

impl Membership {
    /// Open a new active membership for an admitted member and plan.
    ///
    /// The caller must already have passed the admission gate. This only
    /// settles the window: an explicit `end_date` must lie after the start,
    /// otherwise the end is `start + plan.duration_days`.
    pub fn open(
        member: &Member,
        plan: &Plan,
        start_date: CalendarDate,
        end_date: Option<CalendarDate>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let end_date = match end_date {
            Some(end) if end <= start_date => {
                return Err(DomainError::InvalidWindow {
                    start: start_date,
                    end,
                })
            }
            Some(end) => end,
            None => plan.end_date_from(start_date)?,
        };

        Ok(Self {
            id: MembershipId::new(),
            member_id: member.id,
            plan_id: plan.id,
            start_date,
            end_date,
            cancelled_at: None,
            status: MembershipStatus::Active,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == MembershipStatus::Active
    }

    /// Active and past its last valid day.
    pub fn is_lapsed(&self, today: CalendarDate) -> bool {
        self.is_active() && self.end_date < today
    }

    /// Cancel the membership (ACTIVE → CANCELLED).
    pub fn cancel(&mut self, on: CalendarDate, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.require_active()?;
        self.cancelled_at = Some(on);
        self.do_transition(MembershipStatus::Cancelled, now);
        Ok(())
    }

    /// Expire the membership (ACTIVE → EXPIRED).
    pub fn expire(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.require_active()?;
        self.do_transition(MembershipStatus::Expired, now);
        Ok(())
    }

    /// Terminal states are reported with status-specific errors.
    fn require_active(&self) -> Result<(), DomainError> {
        match self.status {
            MembershipStatus::Active => Ok(()),
            MembershipStatus::Cancelled => Err(DomainError::MembershipAlreadyCancelled(self.id)),
            MembershipStatus::Expired => Err(DomainError::MembershipExpired(self.id)),
        }
    }

    fn do_transition(&mut self, to: MembershipStatus, now: DateTime<Utc>) {
        self.status = to;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{at, date, member, plan};

    fn open(start: &str, end: Option<&str>) -> Result<Membership, DomainError> {
        Membership::open(
            &member(),
            &plan(30),
            date(start),
            end.map(date),
            at("2024-01-01T10:00:00Z"),
        )
    }

    #[test]
    fn open_derives_end_date_from_plan() {
        let m = open("2024-01-01", None).unwrap();
        assert_eq!(m.end_date, date("2024-01-31"));
        assert_eq!(m.status, MembershipStatus::Active);
        assert!(m.cancelled_at.is_none());
    }

    #[test]
    fn open_keeps_explicit_end_date() {
        let m = open("2024-01-01", Some("2024-06-30")).unwrap();
        assert_eq!(m.end_date, date("2024-06-30"));
    }

    #[test]
    fn open_rejects_inverted_window() {
        assert!(matches!(
            open("2024-01-10", Some("2024-01-10")),
            Err(DomainError::InvalidWindow { .. })
        ));
        assert!(matches!(
            open("2024-01-10", Some("2024-01-09")),
            Err(DomainError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn cancel_active() {
        let mut m = open("2024-01-01", None).unwrap();
        let now = at("2024-01-15T12:00:00Z");
        m.cancel(date("2024-01-15"), now).unwrap();
        assert_eq!(m.status, MembershipStatus::Cancelled);
        assert_eq!(m.cancelled_at, Some(date("2024-01-15")));
        assert_eq!(m.updated_at, now);
    }

    #[test]
    fn cancel_twice_reports_already_cancelled() {
        let mut m = open("2024-01-01", None).unwrap();
        m.cancel(date("2024-01-15"), Utc::now()).unwrap();
        let err = m.cancel(date("2024-01-16"), Utc::now()).unwrap_err();
        assert_eq!(err, DomainError::MembershipAlreadyCancelled(m.id));
        assert_eq!(m.cancelled_at, Some(date("2024-01-15")));
    }

    #[test]
    fn cancel_expired_reports_expired() {
        let mut m = open("2024-01-01", None).unwrap();
        m.expire(Utc::now()).unwrap();
        let err = m.cancel(date("2024-03-01"), Utc::now()).unwrap_err();
        assert_eq!(err, DomainError::MembershipExpired(m.id));
        assert!(m.cancelled_at.is_none());
    }

    #[test]
    fn terminal_states_do_not_expire() {
        let mut m = open("2024-01-01", None).unwrap();
        m.cancel(date("2024-01-02"), Utc::now()).unwrap();
        assert!(m.expire(Utc::now()).is_err());
        assert_eq!(m.status, MembershipStatus::Cancelled);
    }

    #[test]
    fn lapse_is_exclusive_of_end_date() {
        let m = open("2024-01-01", None).unwrap();
        assert!(!m.is_lapsed(date("2024-01-31")));
        assert!(m.is_lapsed(date("2024-02-01")));
    }

    #[test]
    fn status_text_round_trips() {
        for status in [
            MembershipStatus::Active,
            MembershipStatus::Cancelled,
            MembershipStatus::Expired,
        ] {
            assert_eq!(status.as_str().parse::<MembershipStatus>().unwrap(), status);
        }
        assert!("paused".parse::<MembershipStatus>().is_err());
        assert!(MembershipStatus::Expired.is_terminal());
        assert!(!MembershipStatus::Active.is_terminal());
    }
}
