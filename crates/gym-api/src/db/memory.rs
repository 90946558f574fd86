//! # In-Memory Backend
//!
//! Process-local storage used when no database is configured. Mirrors
//! the Postgres backend's semantics, including its uniqueness rules.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use gym_core::{CalendarDate, CheckInId, MemberId, MembershipId, PageRequest, PlanId};
use gym_state::{CheckIn, DomainError, Member, Membership, Plan};
use parking_lot::RwLock;
use uuid::Uuid;

use super::filters::{CheckInFilter, MemberFilter, MembershipFilter, PlanFilter};
use super::DbError;

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// All operations are synchronous (the RwLock is `parking_lot`, not `tokio::sync`)
/// because the lock is never held across `.await` points.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn insert(&self, id: Uuid, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    /// Insert unless an existing record conflicts with the new one.
    ///
    /// The conflict scan and the insert run under one write lock, so two
    /// concurrent callers cannot both succeed.
    pub fn insert_unique(
        &self,
        id: Uuid,
        value: T,
        conflicts: impl Fn(&T) -> bool,
    ) -> Result<(), T> {
        let mut guard = self.data.write();
        if guard.values().any(conflicts) {
            return Err(value);
        }
        guard.insert(id, value);
        Ok(())
    }

    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// First record matching the predicate.
    pub fn find(&self, pred: impl Fn(&T) -> bool) -> Option<T> {
        self.data.read().values().find(|v| pred(v)).cloned()
    }

    /// All records matching the predicate, in arbitrary order.
    pub fn filter(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.data
            .read()
            .values()
            .filter(|v| pred(v))
            .cloned()
            .collect()
    }

    /// Atomically read-validate-update a record.
    ///
    /// Returns `None` if the record doesn't exist, or `Some(result)` with
    /// the closure's result.
    pub fn try_update<R>(&self, id: &Uuid, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.data.write().get_mut(id).map(f)
    }

    /// Apply `f` to every record matching `pred` under one write lock.
    /// Returns how many records were visited.
    pub fn update_where(&self, pred: impl Fn(&T) -> bool, mut f: impl FnMut(&mut T)) -> u64 {
        let mut guard = self.data.write();
        let mut touched = 0;
        for value in guard.values_mut().filter(|v| pred(v)) {
            f(value);
            touched += 1;
        }
        touched
    }

    pub fn count(&self, pred: impl Fn(&T) -> bool) -> u64 {
        self.data.read().values().filter(|v| pred(v)).count() as u64
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

/// Sort, count and slice one page out of `rows`.
fn paginate<T>(
    mut rows: Vec<T>,
    page: PageRequest,
    compare: impl Fn(&T, &T) -> std::cmp::Ordering,
) -> (Vec<T>, u64) {
    rows.sort_by(|a, b| compare(a, b));
    let total = rows.len() as u64;
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
    let items = rows.into_iter().skip(offset).take(limit).collect();
    (items, total)
}

// -- Memory Store -------------------------------------------------------------

/// All four tables, shared by clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    members: Store<Member>,
    plans: Store<Plan>,
    memberships: Store<Membership>,
    check_ins: Store<CheckIn>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Members

    pub fn insert_member(&self, member: &Member) -> Result<(), DbError> {
        self.members
            .insert_unique(*member.id.as_uuid(), member.clone(), |m| {
                m.email == member.email
            })
            .map_err(|m| DbError::Constraint(DomainError::EmailAlreadyExists(m.email.to_string())))
    }

    pub fn get_member(&self, id: MemberId) -> Option<Member> {
        self.members.get(id.as_uuid())
    }

    pub fn list_members(&self, filter: &MemberFilter, page: PageRequest) -> (Vec<Member>, u64) {
        paginate(self.members.filter(|m| filter.matches(m)), page, |a, b| {
            filter.compare(a, b)
        })
    }

    pub fn mark_member_deleted(&self, member: &Member) -> bool {
        self.members
            .try_update(member.id.as_uuid(), |stored| {
                if stored.is_deleted {
                    return false;
                }
                stored.is_deleted = true;
                stored.updated_at = member.updated_at;
                true
            })
            .unwrap_or(false)
    }

    // Plans

    pub fn insert_plan(&self, plan: &Plan) {
        self.plans.insert(*plan.id.as_uuid(), plan.clone());
    }

    pub fn get_plan(&self, id: PlanId) -> Option<Plan> {
        self.plans.get(id.as_uuid())
    }

    pub fn find_plan_by_name(&self, name: &str) -> Option<Plan> {
        self.plans.find(|p| p.name == name)
    }

    pub fn list_plans(&self, filter: &PlanFilter, page: PageRequest) -> (Vec<Plan>, u64) {
        paginate(self.plans.filter(|p| filter.matches(p)), page, |a, b| {
            filter.compare(a, b)
        })
    }

    // Memberships

    pub fn insert_membership(&self, membership: &Membership) -> Result<(), DbError> {
        let guarded = membership.is_active();
        self.memberships
            .insert_unique(*membership.id.as_uuid(), membership.clone(), |m| {
                guarded && m.member_id == membership.member_id && m.is_active()
            })
            .map_err(|m| DbError::Constraint(DomainError::ActiveMembershipExists(m.member_id)))
    }

    pub fn get_membership(&self, id: MembershipId) -> Option<Membership> {
        self.memberships.get(id.as_uuid())
    }

    pub fn find_active_membership(&self, member_id: MemberId) -> Option<Membership> {
        self.memberships
            .find(|m| m.member_id == member_id && m.is_active())
    }

    pub fn find_active_membership_with_plan(
        &self,
        member_id: MemberId,
    ) -> Option<(Membership, Plan)> {
        let membership = self.find_active_membership(member_id)?;
        let plan = self.get_plan(membership.plan_id)?;
        Some((membership, plan))
    }

    pub fn list_memberships(
        &self,
        filter: &MembershipFilter,
        page: PageRequest,
    ) -> (Vec<Membership>, u64) {
        paginate(
            self.memberships.filter(|m| filter.matches(m)),
            page,
            |a, b| filter.compare(a, b),
        )
    }

    pub fn save_membership_transition(&self, membership: &Membership) -> bool {
        self.memberships
            .try_update(membership.id.as_uuid(), |stored| {
                if !stored.is_active() {
                    return false;
                }
                *stored = membership.clone();
                true
            })
            .unwrap_or(false)
    }

    pub fn count_lapsed_memberships(&self, as_of: CalendarDate) -> u64 {
        self.memberships.count(|m| m.is_lapsed(as_of))
    }

    pub fn expire_lapsed_memberships(&self, as_of: CalendarDate, now: DateTime<Utc>) -> u64 {
        self.memberships.update_where(
            |m| m.is_lapsed(as_of),
            |m| {
                if let Err(e) = m.expire(now) {
                    tracing::warn!(membership_id = %m.id, error = %e, "skipped expiry");
                }
            },
        )
    }

    // Check-ins

    pub fn insert_check_in(&self, check_in: &CheckIn) {
        self.check_ins
            .insert(*check_in.id.as_uuid(), check_in.clone());
    }

    pub fn get_check_in(&self, id: CheckInId) -> Option<CheckIn> {
        self.check_ins.get(id.as_uuid())
    }

    pub fn list_check_ins(&self, filter: &CheckInFilter, page: PageRequest) -> (Vec<CheckIn>, u64) {
        paginate(self.check_ins.filter(|c| filter.matches(c)), page, |a, b| {
            filter.compare(a, b)
        })
    }

    pub fn last_check_in_at(&self, member_id: MemberId) -> Option<DateTime<Utc>> {
        self.check_ins
            .filter(|c| c.member_id == member_id)
            .into_iter()
            .map(|c| c.checked_in_at)
            .max()
    }

    pub fn count_check_ins_since(&self, member_id: MemberId, since: DateTime<Utc>) -> u64 {
        self.check_ins
            .count(|c| c.member_id == member_id && c.checked_in_at >= since)
    }
}
