//! # gym-state: Membership Lifecycle Engine
//!
//! The rules that keep membership data consistent, expressed as pure
//! functions over already-fetched records. Storage and HTTP live in
//! `gym-api`; both storage backends drive the same rules from here.
//!
//! ## Membership state machine
//!
//! ```text
//! (open) ──▶ Active ──▶ Cancelled (terminal)
//!              │
//!              └──────▶ Expired   (terminal, explicit sweep only)
//! ```
//!
//! ## Gates
//!
//! - **Admission** (`admission.rs`): member exists, member not deleted,
//!   plan exists, plan active, no active membership. Callers evaluate the
//!   steps in that order and stop at the first failure.
//! - **Check-in** (`admission.rs`): member exists, member not deleted,
//!   member holds an active membership.
//!
//! ## Crate Policy
//!
//! - Depends only on `gym-core`.
//! - No I/O, no async, no clocks: "now" and "today" are always passed in.

pub mod admission;
pub mod check_in;
pub mod error;
pub mod member;
pub mod membership;
pub mod plan;

pub use admission::{
    require_active_membership, require_assignable_plan, require_member,
    require_no_active_membership,
};
pub use check_in::{CheckIn, PROFILE_WINDOW_DAYS};
pub use error::DomainError;
pub use member::{Member, MemberRegistration};
pub use membership::{Membership, MembershipRequest, MembershipStatus, UnknownStatus};
pub use plan::{Plan, PlanDraft};

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, Utc};
    use gym_core::CalendarDate;

    use crate::{Member, MemberRegistration, Plan, PlanDraft};

    pub fn date(s: &str) -> CalendarDate {
        CalendarDate::parse(s).unwrap()
    }

    pub fn at(s: &str) -> DateTime<Utc> {
        gym_core::parse_timestamp(s).unwrap()
    }

    pub fn member() -> Member {
        MemberRegistration {
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            email: "grace@example.com".into(),
            phone: None,
        }
        .into_member(at("2024-01-01T09:00:00Z"))
        .unwrap()
    }

    pub fn plan(duration_days: i32) -> Plan {
        PlanDraft {
            name: format!("{duration_days}-day"),
            description: None,
            price_cents: 2_500,
            duration_days,
            is_active: true,
        }
        .into_plan(at("2024-01-01T09:00:00Z"))
        .unwrap()
    }
}
