//! Membership creation, cancellation and the expiry sweep.

use chrono::{DateTime, Utc};
use gym_core::{CalendarDate, MembershipId, PageRequest};
use gym_state::{
    require_assignable_plan, require_member, require_no_active_membership, DomainError,
    Membership, MembershipRequest,
};

use crate::db::{Database, MembershipFilter};
use crate::error::AppError;

/// Open a membership after the admission gate.
///
/// Order: member exists, member not deleted, plan exists, plan active, no
/// active membership. The last step is a pre-check; a concurrent request
/// that slips past it is rejected by the storage constraint with the same
/// `ActiveMembershipExists` error, and nothing is written in either case.
pub async fn create(
    db: &Database,
    request: MembershipRequest,
    now: DateTime<Utc>,
) -> Result<Membership, AppError> {
    let member = require_member(db.get_member(request.member_id).await?, request.member_id)?;
    let plan = require_assignable_plan(db.get_plan(request.plan_id).await?, request.plan_id)?;
    let active = db.find_active_membership(member.id).await?;
    require_no_active_membership(active.as_ref(), member.id)?;

    let membership = Membership::open(&member, &plan, request.start_date, request.end_date, now)?;
    db.insert_membership(&membership).await?;

    tracing::info!(
        membership_id = %membership.id,
        member_id = %member.id,
        plan_id = %plan.id,
        end_date = %membership.end_date,
        "membership opened"
    );
    Ok(membership)
}

pub async fn get(db: &Database, id: MembershipId) -> Result<Membership, AppError> {
    Ok(db
        .get_membership(id)
        .await?
        .ok_or(DomainError::MembershipNotFound(id))?)
}

pub async fn list(
    db: &Database,
    filter: &MembershipFilter,
    page: PageRequest,
) -> Result<(Vec<Membership>, u64), AppError> {
    Ok(db.list_memberships(filter, page).await?)
}

/// Cancel an active membership. `cancelled_at` defaults to today's date on
/// the server clock.
///
/// The write is conditional on the stored status still being `active`. If
/// another writer got there first, the stored record is re-read and its
/// status decides the error.
pub async fn cancel(
    db: &Database,
    id: MembershipId,
    cancelled_at: Option<CalendarDate>,
    now: DateTime<Utc>,
) -> Result<Membership, AppError> {
    let mut membership = get(db, id).await?;
    let on = match cancelled_at {
        Some(on) => on,
        None => CalendarDate::from_naive(now.date_naive())
            .map_err(|e| AppError::Internal(format!("server date out of range: {e}")))?,
    };
    membership.cancel(on, now)?;

    if !db.save_membership_transition(&membership).await? {
        let mut current = get(db, id).await?;
        current.cancel(on, now)?;
        return Err(AppError::Internal(format!(
            "membership {id} changed concurrently but is still active"
        )));
    }

    tracing::info!(membership_id = %id, cancelled_at = %on, "membership cancelled");
    Ok(membership)
}

/// Number of memberships the sweep would expire as of `as_of`.
pub async fn count_lapsed(db: &Database, as_of: CalendarDate) -> Result<u64, AppError> {
    Ok(db.count_lapsed_memberships(as_of).await?)
}

/// Transition every active membership whose end date is before `as_of` to
/// `expired`. A membership is valid through its end date inclusive.
pub async fn expire_lapsed(
    db: &Database,
    as_of: CalendarDate,
    now: DateTime<Utc>,
) -> Result<u64, AppError> {
    let expired = db.expire_lapsed_memberships(as_of, now).await?;
    tracing::info!(as_of = %as_of, expired, "expiry sweep finished");
    Ok(expired)
}
