//! # Admission and Check-in Gates
//!
//! Ordered precondition steps. Membership creation runs
//! `require_member`, `require_assignable_plan`,
//! `require_no_active_membership`; check-in runs `require_member`,
//! `require_active_membership`. Each step consumes the result of one
//! lookup, so a caller fetches the next input only after the previous
//! step passed and the first failure decides the reported error.
//!
//! The "no active membership" step is an early exit. The storage-layer
//! uniqueness constraint remains the authority for that invariant.

use gym_core::{MemberId, PlanId};

use crate::error::DomainError;
use crate::member::Member;
use crate::membership::Membership;
use crate::plan::Plan;

/// Member exists, then member is not soft-deleted.
pub fn require_member(found: Option<Member>, id: MemberId) -> Result<Member, DomainError> {
    let member = found.ok_or(DomainError::MemberNotFound(id))?;
    member.ensure_usable()?;
    Ok(member)
}

/// Plan exists, then plan is active.
pub fn require_assignable_plan(found: Option<Plan>, id: PlanId) -> Result<Plan, DomainError> {
    let plan = found.ok_or(DomainError::PlanNotFound(id))?;
    plan.ensure_assignable()?;
    Ok(plan)
}

/// Member holds no active membership.
pub fn require_no_active_membership(
    active: Option<&Membership>,
    member_id: MemberId,
) -> Result<(), DomainError> {
    match active {
        Some(m) if m.is_active() => Err(DomainError::ActiveMembershipExists(member_id)),
        _ => Ok(()),
    }
}

/// Member holds an active membership, which is returned.
pub fn require_active_membership(
    active: Option<Membership>,
    member_id: MemberId,
) -> Result<Membership, DomainError> {
    active
        .filter(Membership::is_active)
        .ok_or(DomainError::NoActiveMembership(member_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{date, member, plan};
    use chrono::Utc;

    #[test]
    fn missing_member_wins_over_deletion() {
        let id = MemberId::new();
        assert_eq!(
            require_member(None, id),
            Err(DomainError::MemberNotFound(id))
        );
    }

    #[test]
    fn deleted_member_is_refused() {
        let mut m = member();
        m.soft_delete(Utc::now()).unwrap();
        let id = m.id;
        assert_eq!(require_member(Some(m), id), Err(DomainError::MemberDeleted(id)));
    }

    #[test]
    fn plan_checks() {
        let id = PlanId::new();
        assert_eq!(
            require_assignable_plan(None, id),
            Err(DomainError::PlanNotFound(id))
        );

        let mut p = plan(30);
        p.is_active = false;
        let pid = p.id;
        assert_eq!(
            require_assignable_plan(Some(p), pid),
            Err(DomainError::PlanInactive(pid))
        );
        assert!(require_assignable_plan(Some(plan(7)), pid).is_ok());
    }

    #[test]
    fn active_membership_blocks_admission_but_enables_check_in() {
        let m = member();
        let membership =
            Membership::open(&m, &plan(30), date("2024-01-01"), None, Utc::now()).unwrap();

        assert_eq!(
            require_no_active_membership(Some(&membership), m.id),
            Err(DomainError::ActiveMembershipExists(m.id))
        );
        assert!(require_no_active_membership(None, m.id).is_ok());

        let granted = require_active_membership(Some(membership.clone()), m.id).unwrap();
        assert_eq!(granted.id, membership.id);
    }

    #[test]
    fn terminal_membership_does_not_grant_check_in() {
        let m = member();
        let mut membership =
            Membership::open(&m, &plan(30), date("2024-01-01"), None, Utc::now()).unwrap();
        membership.cancel(date("2024-01-02"), Utc::now()).unwrap();

        assert!(require_no_active_membership(Some(&membership), m.id).is_ok());
        assert_eq!(
            require_active_membership(Some(membership), m.id),
            Err(DomainError::NoActiveMembership(m.id))
        );
        assert_eq!(
            require_active_membership(None, m.id),
            Err(DomainError::NoActiveMembership(m.id))
        );
    }
}
