//! Check-in recording behind the eligibility gate.

use chrono::{DateTime, Utc};
use gym_core::{CheckInId, MemberId, PageRequest};
use gym_state::{require_active_membership, require_member, CheckIn, DomainError};

use crate::db::{CheckInFilter, Database};
use crate::error::AppError;

/// Record a check-in against the member's active membership.
///
/// Order: member exists, member not deleted, member holds an active
/// membership. Nothing is written unless every step passes. A supplied
/// `checked_in_at` is stored as given, including future instants.
pub async fn record(
    db: &Database,
    member_id: MemberId,
    checked_in_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<CheckIn, AppError> {
    let member = require_member(db.get_member(member_id).await?, member_id)?;
    let membership =
        require_active_membership(db.find_active_membership(member_id).await?, member_id)?;

    let check_in = CheckIn::record(&member, &membership, checked_in_at, now);
    db.insert_check_in(&check_in).await?;

    tracing::debug!(
        check_in_id = %check_in.id,
        member_id = %member_id,
        membership_id = %membership.id,
        "check-in recorded"
    );
    Ok(check_in)
}

pub async fn get(db: &Database, id: CheckInId) -> Result<CheckIn, AppError> {
    Ok(db
        .get_check_in(id)
        .await?
        .ok_or(DomainError::CheckInNotFound(id))?)
}

pub async fn list(
    db: &Database,
    filter: &CheckInFilter,
    page: PageRequest,
) -> Result<(Vec<CheckIn>, u64), AppError> {
    Ok(db.list_check_ins(filter, page).await?)
}
