//! # Check-ins
//!
//! Immutable attendance events. A check-in always references the
//! member's active membership at the time it was recorded.

use chrono::{DateTime, Duration, Utc};
use gym_core::{CheckInId, MemberId, MembershipId};
use serde::{Deserialize, Serialize};

use crate::member::Member;
use crate::membership::Membership;

/// Length of the trailing window counted on a member profile.
pub const PROFILE_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckIn {
    pub id: CheckInId,
    pub member_id: MemberId,
    pub membership_id: MembershipId,
    pub checked_in_at: DateTime<Utc>,
}

impl CheckIn {
    /// Record a check-in against a membership that passed the check-in
    /// gate. A caller-supplied instant is kept verbatim; otherwise `now`.
    pub fn record(
        member: &Member,
        membership: &Membership,
        checked_in_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CheckInId::new(),
            member_id: member.id,
            membership_id: membership.id,
            checked_in_at: checked_in_at.unwrap_or(now),
        }
    }

    /// Start of the profile window ending at `now`.
    pub fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(PROFILE_WINDOW_DAYS)
    }
}
