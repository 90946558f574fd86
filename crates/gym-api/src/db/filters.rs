//! # Listing Filters
//!
//! Validated filter and sort settings for the four listings. Sort fields
//! map to a fixed whitelist of SQL order expressions, and to comparators
//! for the memory store. Every ordering breaks ties by `id` so repeated
//! reads of unchanged data return identical pages.
//!
//! Text keys (names, emails) sort case-folded and then bytewise on both
//! backends: SQL orders by `lower(col) COLLATE "C"` rather than the
//! database collation, and the memory store compares `to_lowercase()`
//! keys. Both backends therefore page `"alice"` and `"Bob"` the same way.

use std::cmp::Ordering;

use gym_core::{CalendarDate, MemberId, MembershipId, PlanId, SortOrder};
use gym_state::{CheckIn, Member, Membership, MembershipStatus, Plan};
use serde::Deserialize;
use utoipa::ToSchema;

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Case-folded text key, matching `lower(col) COLLATE "C"` in SQL.
fn folded(text: &str) -> String {
    text.to_lowercase()
}

/// Compare by key, then by id, in the requested direction.
fn ordered<K: Ord, I: Ord>(order: SortOrder, a: (K, I), b: (K, I)) -> Ordering {
    order.apply(a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)))
}

// ─── Members ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum MemberSortField {
    FirstName,
    LastName,
    Email,
    #[default]
    CreatedAt,
}

impl MemberSortField {
    pub fn order_expr(&self) -> &'static str {
        match self {
            Self::FirstName => r#"lower(first_name) COLLATE "C""#,
            Self::LastName => r#"lower(last_name) COLLATE "C""#,
            Self::Email => r#"lower(email) COLLATE "C""#,
            Self::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberFilter {
    /// Case-insensitive substring over first name, last name and email.
    pub search: Option<String>,
    pub include_deleted: bool,
    pub sort_by: MemberSortField,
    pub sort_order: SortOrder,
}

impl MemberFilter {
    pub fn matches(&self, member: &Member) -> bool {
        if member.is_deleted && !self.include_deleted {
            return false;
        }
        match &self.search {
            Some(search) => {
                let needle = search.to_lowercase();
                contains_ci(&member.first_name, &needle)
                    || contains_ci(&member.last_name, &needle)
                    || contains_ci(member.email.as_str(), &needle)
            }
            None => true,
        }
    }

    pub fn compare(&self, a: &Member, b: &Member) -> Ordering {
        let o = self.sort_order;
        match self.sort_by {
            MemberSortField::FirstName => ordered(
                o,
                (folded(&a.first_name), a.id),
                (folded(&b.first_name), b.id),
            ),
            MemberSortField::LastName => ordered(
                o,
                (folded(&a.last_name), a.id),
                (folded(&b.last_name), b.id),
            ),
            MemberSortField::Email => ordered(
                o,
                (folded(a.email.as_str()), a.id),
                (folded(b.email.as_str()), b.id),
            ),
            MemberSortField::CreatedAt => ordered(o, (a.created_at, a.id), (b.created_at, b.id)),
        }
    }
}

// ─── Plans ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum PlanSortField {
    Name,
    PriceCents,
    DurationDays,
    #[default]
    CreatedAt,
}

impl PlanSortField {
    pub fn order_expr(&self) -> &'static str {
        match self {
            Self::Name => r#"lower(name) COLLATE "C""#,
            Self::PriceCents => "price_cents",
            Self::DurationDays => "duration_days",
            Self::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanFilter {
    /// Case-insensitive substring over name and description.
    pub search: Option<String>,
    pub is_active: Option<bool>,
    pub sort_by: PlanSortField,
    pub sort_order: SortOrder,
}

impl PlanFilter {
    pub fn matches(&self, plan: &Plan) -> bool {
        if let Some(active) = self.is_active {
            if plan.is_active != active {
                return false;
            }
        }
        match &self.search {
            Some(search) => {
                let needle = search.to_lowercase();
                contains_ci(&plan.name, &needle)
                    || plan
                        .description
                        .as_deref()
                        .is_some_and(|d| contains_ci(d, &needle))
            }
            None => true,
        }
    }

    pub fn compare(&self, a: &Plan, b: &Plan) -> Ordering {
        let o = self.sort_order;
        match self.sort_by {
            PlanSortField::Name => ordered(o, (folded(&a.name), a.id), (folded(&b.name), b.id)),
            PlanSortField::PriceCents => ordered(o, (a.price_cents, a.id), (b.price_cents, b.id)),
            PlanSortField::DurationDays => {
                ordered(o, (a.duration_days, a.id), (b.duration_days, b.id))
            }
            PlanSortField::CreatedAt => ordered(o, (a.created_at, a.id), (b.created_at, b.id)),
        }
    }
}

// ─── Memberships ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum MembershipSortField {
    StartDate,
    EndDate,
    #[default]
    CreatedAt,
}

impl MembershipSortField {
    pub fn order_expr(&self) -> &'static str {
        match self {
            Self::StartDate => "start_date",
            Self::EndDate => "end_date",
            Self::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipFilter {
    pub member_id: Option<MemberId>,
    pub plan_id: Option<PlanId>,
    pub status: Option<MembershipStatus>,
    /// Inclusive lower bound on `start_date`.
    pub start_date_from: Option<CalendarDate>,
    /// Inclusive upper bound on `start_date`.
    pub start_date_to: Option<CalendarDate>,
    pub sort_by: MembershipSortField,
    pub sort_order: SortOrder,
}

impl MembershipFilter {
    pub fn matches(&self, m: &Membership) -> bool {
        self.member_id.map_or(true, |id| m.member_id == id)
            && self.plan_id.map_or(true, |id| m.plan_id == id)
            && self.status.map_or(true, |s| m.status == s)
            && self.start_date_from.map_or(true, |d| m.start_date >= d)
            && self.start_date_to.map_or(true, |d| m.start_date <= d)
    }

    pub fn compare(&self, a: &Membership, b: &Membership) -> Ordering {
        let o = self.sort_order;
        match self.sort_by {
            MembershipSortField::StartDate => {
                ordered(o, (a.start_date, a.id), (b.start_date, b.id))
            }
            MembershipSortField::EndDate => ordered(o, (a.end_date, a.id), (b.end_date, b.id)),
            MembershipSortField::CreatedAt => {
                ordered(o, (a.created_at, a.id), (b.created_at, b.id))
            }
        }
    }
}

// ─── Check-ins ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum CheckInSortField {
    #[default]
    CheckedInAt,
}

impl CheckInSortField {
    pub fn order_expr(&self) -> &'static str {
        match self {
            Self::CheckedInAt => "checked_in_at",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckInFilter {
    pub member_id: Option<MemberId>,
    pub membership_id: Option<MembershipId>,
    /// From the start of this day, inclusive.
    pub date_from: Option<CalendarDate>,
    /// Through the end of this day, inclusive.
    pub date_to: Option<CalendarDate>,
    pub sort_by: CheckInSortField,
    pub sort_order: SortOrder,
}

impl CheckInFilter {
    pub fn matches(&self, c: &CheckIn) -> bool {
        self.member_id.map_or(true, |id| c.member_id == id)
            && self.membership_id.map_or(true, |id| c.membership_id == id)
            && self
                .date_from
                .map_or(true, |d| c.checked_in_at >= d.start_of_day())
            && self
                .date_to
                .map_or(true, |d| c.checked_in_at <= d.end_of_day())
    }

    pub fn compare(&self, a: &CheckIn, b: &CheckIn) -> Ordering {
        match self.sort_by {
            CheckInSortField::CheckedInAt => ordered(
                self.sort_order,
                (a.checked_in_at, a.id),
                (b.checked_in_at, b.id),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gym_state::MemberRegistration;

    fn member(first: &str, last: &str, email: &str) -> Member {
        MemberRegistration {
            first_name: first.into(),
            last_name: last.into(),
            email: email.into(),
            phone: None,
        }
        .into_member(Utc::now())
        .unwrap()
    }

    #[test]
    fn member_search_is_case_insensitive_across_fields() {
        let m = member("Marie", "Curie", "mcurie@radium.org");
        let search = |s: &str| MemberFilter {
            search: Some(s.into()),
            ..Default::default()
        };
        assert!(search("MAR").matches(&m));
        assert!(search("curi").matches(&m));
        assert!(search("RADIUM").matches(&m));
        assert!(!search("tesla").matches(&m));
    }

    #[test]
    fn deleted_members_hidden_by_default() {
        let mut m = member("Nikola", "Tesla", "nt@ac.io");
        m.soft_delete(Utc::now()).unwrap();
        assert!(!MemberFilter::default().matches(&m));
        let all = MemberFilter {
            include_deleted: true,
            ..Default::default()
        };
        assert!(all.matches(&m));
    }

    #[test]
    fn sort_direction_and_tie_break() {
        let a = member("Ada", "Z", "a@x.io");
        let b = member("Bea", "Z", "b@x.io");
        let asc = MemberFilter {
            sort_by: MemberSortField::FirstName,
            sort_order: SortOrder::Asc,
            ..Default::default()
        };
        assert_eq!(asc.compare(&a, &b), Ordering::Less);
        let desc = MemberFilter {
            sort_order: SortOrder::Desc,
            ..asc.clone()
        };
        assert_eq!(desc.compare(&a, &b), Ordering::Greater);

        let by_last = MemberFilter {
            sort_by: MemberSortField::LastName,
            sort_order: SortOrder::Asc,
            ..Default::default()
        };
        assert_eq!(by_last.compare(&a, &b), a.id.cmp(&b.id));
    }

    #[test]
    fn name_sort_ignores_case() {
        let lower = member("alice", "smith", "alice@x.io");
        let upper = member("Bob", "Smith", "bob@x.io");
        let asc = MemberFilter {
            sort_by: MemberSortField::FirstName,
            sort_order: SortOrder::Asc,
            ..Default::default()
        };
        // Bytewise, "Bob" < "alice".
        assert_eq!(asc.compare(&lower, &upper), Ordering::Less);

        let by_last = MemberFilter {
            sort_by: MemberSortField::LastName,
            ..asc.clone()
        };
        assert_eq!(by_last.compare(&lower, &upper), lower.id.cmp(&upper.id));

        let plan = |name: &str| {
            gym_state::PlanDraft {
                name: name.into(),
                description: None,
                price_cents: 0,
                duration_days: 30,
                is_active: true,
            }
            .into_plan(Utc::now())
            .unwrap()
        };
        let by_name = PlanFilter {
            sort_by: PlanSortField::Name,
            sort_order: SortOrder::Asc,
            ..Default::default()
        };
        assert_eq!(by_name.compare(&plan("annual"), &plan("Monthly")), Ordering::Less);
    }

    #[test]
    fn check_in_date_bounds_are_inclusive_days() {
        let day = CalendarDate::parse("2024-04-02").unwrap();
        let filter = CheckInFilter {
            date_from: Some(day),
            date_to: Some(day),
            ..Default::default()
        };
        let at = |ts: &str| CheckIn {
            id: gym_core::CheckInId::new(),
            member_id: MemberId::new(),
            membership_id: MembershipId::new(),
            checked_in_at: gym_core::parse_timestamp(ts).unwrap(),
        };
        assert!(filter.matches(&at("2024-04-02T00:00:00Z")));
        assert!(filter.matches(&at("2024-04-02T23:59:59.999Z")));
        assert!(!filter.matches(&at("2024-04-03T00:00:00Z")));
        assert!(!filter.matches(&at("2024-04-01T23:59:59Z")));
    }

    #[test]
    fn sort_field_whitelist() {
        let json = serde_json::json!("priceCents");
        let field: PlanSortField = serde_json::from_value(json).unwrap();
        assert_eq!(field.order_expr(), "price_cents");
        assert_eq!(PlanSortField::Name.order_expr(), r#"lower(name) COLLATE "C""#);
        assert!(serde_json::from_value::<PlanSortField>(serde_json::json!("id; DROP")).is_err());
    }
}
