//! # API Records
//!
//! Wire representations of the lifecycle records, with `ToSchema` derives
//! for the OpenAPI document. Field names are camelCase; dates are
//! `YYYY-MM-DD`; timestamps are RFC 3339.

use chrono::{DateTime, Utc};
use gym_core::CalendarDate;
use gym_state::{CheckIn, Member, Membership, MembershipStatus, Plan};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberRecord {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    /// Stored lowercased; unique across members.
    pub email: String,
    pub phone: Option<String>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Member> for MemberRecord {
    fn from(m: Member) -> Self {
        Self {
            id: *m.id.as_uuid(),
            first_name: m.first_name,
            last_name: m.last_name,
            email: m.email.into(),
            phone: m.phone.map(String::from),
            is_deleted: m.is_deleted,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanRecord {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i32,
    pub duration_days: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Plan> for PlanRecord {
    fn from(p: Plan) -> Self {
        Self {
            id: *p.id.as_uuid(),
            name: p.name,
            description: p.description,
            price_cents: p.price_cents,
            duration_days: p.duration_days,
            is_active: p.is_active,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Membership lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatusView {
    Active,
    Cancelled,
    Expired,
}

impl From<MembershipStatus> for MembershipStatusView {
    fn from(s: MembershipStatus) -> Self {
        match s {
            MembershipStatus::Active => Self::Active,
            MembershipStatus::Cancelled => Self::Cancelled,
            MembershipStatus::Expired => Self::Expired,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRecord {
    pub id: Uuid,
    pub member_id: Uuid,
    pub plan_id: Uuid,
    #[schema(value_type = String, format = Date, example = "2024-01-01")]
    pub start_date: CalendarDate,
    #[schema(value_type = String, format = Date, example = "2024-01-31")]
    pub end_date: CalendarDate,
    #[schema(value_type = Option<String>, format = Date)]
    pub cancelled_at: Option<CalendarDate>,
    pub status: MembershipStatusView,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Membership> for MembershipRecord {
    fn from(m: Membership) -> Self {
        Self {
            id: *m.id.as_uuid(),
            member_id: *m.member_id.as_uuid(),
            plan_id: *m.plan_id.as_uuid(),
            start_date: m.start_date,
            end_date: m.end_date,
            cancelled_at: m.cancelled_at,
            status: m.status.into(),
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRecord {
    pub id: Uuid,
    pub member_id: Uuid,
    pub membership_id: Uuid,
    pub checked_in_at: DateTime<Utc>,
}

impl From<CheckIn> for CheckInRecord {
    fn from(c: CheckIn) -> Self {
        Self {
            id: *c.id.as_uuid(),
            member_id: *c.member_id.as_uuid(),
            membership_id: *c.membership_id.as_uuid(),
            checked_in_at: c.checked_in_at,
        }
    }
}

/// Active membership with its plan embedded.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MembershipWithPlan {
    #[serde(flatten)]
    pub membership: MembershipRecord,
    pub plan: PlanRecord,
}

/// Read-only profile aggregate.
///
/// The three derived values are read independently and are not taken from
/// a single snapshot; under concurrent writes they may disagree.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberProfile {
    pub member: MemberRecord,
    pub active_membership: Option<MembershipWithPlan>,
    pub last_check_in: Option<DateTime<Utc>>,
    pub check_ins_last30_days: u64,
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}
