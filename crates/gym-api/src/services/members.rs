//! Member registration, listing, profile aggregation and soft deletion.

use chrono::{DateTime, Utc};
use gym_core::{MemberId, PageRequest};
use gym_state::{require_member, CheckIn, DomainError, Member, MemberRegistration};

use crate::db::{Database, MemberFilter};
use crate::error::AppError;
use crate::models::{MemberProfile, MembershipWithPlan};

/// Validate and store a new member.
///
/// Email uniqueness is left to storage: a taken address fails the insert
/// with `EmailAlreadyExists`.
pub async fn register(
    db: &Database,
    registration: MemberRegistration,
    now: DateTime<Utc>,
) -> Result<Member, AppError> {
    let member = registration.into_member(now)?;
    db.insert_member(&member).await?;
    tracing::info!(member_id = %member.id, "member registered");
    Ok(member)
}

pub async fn list(
    db: &Database,
    filter: &MemberFilter,
    page: PageRequest,
) -> Result<(Vec<Member>, u64), AppError> {
    Ok(db.list_members(filter, page).await?)
}

/// Member plus active membership, last check-in and trailing check-in count.
///
/// The three derived values come from independent reads with no shared
/// snapshot. A check-in or cancellation landing between them can make the
/// values disagree with each other.
pub async fn profile(
    db: &Database,
    id: MemberId,
    now: DateTime<Utc>,
) -> Result<MemberProfile, AppError> {
    let member = require_member(db.get_member(id).await?, id)?;

    let active = db.find_active_membership_with_plan(id).await?;
    let last_check_in = db.last_check_in_at(id).await?;
    let recent = db
        .count_check_ins_since(id, CheckIn::window_start(now))
        .await?;

    Ok(MemberProfile {
        member: member.into(),
        active_membership: active.map(|(membership, plan)| MembershipWithPlan {
            membership: membership.into(),
            plan: plan.into(),
        }),
        last_check_in,
        check_ins_last30_days: recent,
    })
}

/// Soft-delete a member. A second deletion fails with `MemberDeleted`.
pub async fn soft_delete(db: &Database, id: MemberId, now: DateTime<Utc>) -> Result<Member, AppError> {
    let mut member = db
        .get_member(id)
        .await?
        .ok_or(DomainError::MemberNotFound(id))?;
    member.soft_delete(now)?;

    if !db.mark_member_deleted(&member).await? {
        return Err(DomainError::MemberDeleted(id).into());
    }
    tracing::info!(member_id = %id, "member soft-deleted");
    Ok(member)
}
