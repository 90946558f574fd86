//! Membership persistence operations.
//!
//! The partial unique index `idx_memberships_member_active` is the
//! authority for "one active membership per member". Inserts that trip it
//! are reported as `ActiveMembershipExists`, the same error the
//! application-level pre-check produces.

use chrono::{DateTime, NaiveDate, Utc};
use gym_core::{CalendarDate, MemberId, MembershipId, PageRequest, PlanId};
use gym_state::{DomainError, Membership, MembershipStatus, Plan};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::filters::MembershipFilter;
use super::{unique_violation, DbError};

const COLUMNS: &str =
    "id, member_id, plan_id, start_date, end_date, cancelled_at, status, created_at, updated_at";

/// Partial unique index allowing one `active` membership per member.
pub(crate) const ACTIVE_INDEX: &str = "idx_memberships_member_active";

pub async fn insert(pool: &PgPool, membership: &Membership) -> Result<(), DbError> {
    let result = sqlx::query(
        "INSERT INTO memberships
            (id, member_id, plan_id, start_date, end_date, cancelled_at, status, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(membership.id.as_uuid())
    .bind(membership.member_id.as_uuid())
    .bind(membership.plan_id.as_uuid())
    .bind(membership.start_date.as_naive())
    .bind(membership.end_date.as_naive())
    .bind(membership.cancelled_at.map(|d| d.as_naive()))
    .bind(membership.status.as_str())
    .bind(membership.created_at)
    .bind(membership.updated_at)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(e) if unique_violation(&e).as_deref() == Some(ACTIVE_INDEX) => {
            tracing::info!(
                member_id = %membership.member_id,
                "concurrent membership creation rejected by unique index"
            );
            Err(DbError::Constraint(DomainError::ActiveMembershipExists(
                membership.member_id,
            )))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn get_by_id(pool: &PgPool, id: MembershipId) -> Result<Option<Membership>, DbError> {
    let row = sqlx::query_as::<_, MembershipRow>(&format!(
        "SELECT {COLUMNS} FROM memberships WHERE id = $1"
    ))
    .bind(id.as_uuid())
    .fetch_optional(pool)
    .await?;
    row.map(MembershipRow::into_record).transpose()
}

pub async fn find_active_for_member(
    pool: &PgPool,
    member_id: MemberId,
) -> Result<Option<Membership>, DbError> {
    let row = sqlx::query_as::<_, MembershipRow>(&format!(
        "SELECT {COLUMNS} FROM memberships WHERE member_id = $1 AND status = 'active'"
    ))
    .bind(member_id.as_uuid())
    .fetch_optional(pool)
    .await?;
    row.map(MembershipRow::into_record).transpose()
}

/// Active membership joined with its plan.
pub async fn find_active_with_plan(
    pool: &PgPool,
    member_id: MemberId,
) -> Result<Option<(Membership, Plan)>, DbError> {
    let row = sqlx::query_as::<_, ActiveWithPlanRow>(
        "SELECT m.id, m.member_id, m.plan_id, m.start_date, m.end_date, m.cancelled_at,
                m.status, m.created_at, m.updated_at,
                p.name AS plan_name, p.description AS plan_description,
                p.price_cents AS plan_price_cents, p.duration_days AS plan_duration_days,
                p.is_active AS plan_is_active, p.created_at AS plan_created_at,
                p.updated_at AS plan_updated_at
         FROM memberships m
         JOIN plans p ON p.id = m.plan_id
         WHERE m.member_id = $1 AND m.status = 'active'",
    )
    .bind(member_id.as_uuid())
    .fetch_optional(pool)
    .await?;
    row.map(ActiveWithPlanRow::into_records).transpose()
}

pub async fn list(
    pool: &PgPool,
    filter: &MembershipFilter,
    page: PageRequest,
) -> Result<(Vec<Membership>, u64), DbError> {
    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM memberships WHERE TRUE");
    push_filters(&mut count, filter);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut select =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM memberships WHERE TRUE"));
    push_filters(&mut select, filter);
    let dir = filter.sort_order.as_sql();
    select.push(format!(
        " ORDER BY {} {dir}, id {dir}",
        filter.sort_by.order_expr()
    ));
    select
        .push(" LIMIT ")
        .push_bind(page.limit() as i64)
        .push(" OFFSET ")
        .push_bind(page.offset() as i64);

    let rows: Vec<MembershipRow> = select.build_query_as().fetch_all(pool).await?;
    let memberships = rows
        .into_iter()
        .map(MembershipRow::into_record)
        .collect::<Result<Vec<_>, _>>()?;
    Ok((memberships, total.max(0) as u64))
}

/// Write a transition out of `active`. Guarded on the stored status so a
/// concurrent transition cannot be overwritten.
pub async fn save_transition(pool: &PgPool, membership: &Membership) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE memberships
         SET status = $2, cancelled_at = $3, updated_at = $4
         WHERE id = $1 AND status = 'active'",
    )
    .bind(membership.id.as_uuid())
    .bind(membership.status.as_str())
    .bind(membership.cancelled_at.map(|d| d.as_naive()))
    .bind(membership.updated_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn count_lapsed(pool: &PgPool, as_of: CalendarDate) -> Result<u64, DbError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM memberships WHERE status = 'active' AND end_date < $1",
    )
    .bind(as_of.as_naive())
    .fetch_one(pool)
    .await?;
    Ok(count.max(0) as u64)
}

/// Expire every active membership whose end date is before `as_of`.
pub async fn expire_lapsed(
    pool: &PgPool,
    as_of: CalendarDate,
    now: DateTime<Utc>,
) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE memberships SET status = 'expired', updated_at = $2
         WHERE status = 'active' AND end_date < $1",
    )
    .bind(as_of.as_naive())
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &MembershipFilter) {
    if let Some(id) = filter.member_id {
        qb.push(" AND member_id = ").push_bind(*id.as_uuid());
    }
    if let Some(id) = filter.plan_id {
        qb.push(" AND plan_id = ").push_bind(*id.as_uuid());
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(from) = filter.start_date_from {
        qb.push(" AND start_date >= ").push_bind(from.as_naive());
    }
    if let Some(to) = filter.start_date_to {
        qb.push(" AND start_date <= ").push_bind(to.as_naive());
    }
}

// -- Row types ----------------------------------------------------------------

#[derive(sqlx::FromRow)]
struct MembershipRow {
    id: Uuid,
    member_id: Uuid,
    plan_id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
    cancelled_at: Option<NaiveDate>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MembershipRow {
    fn into_record(self) -> Result<Membership, DbError> {
        let status: MembershipStatus = self.status.parse().map_err(|e: gym_state::UnknownStatus| {
            DbError::CorruptRow {
                table: "memberships",
                reason: e.to_string(),
            }
        })?;
        let date = |d: NaiveDate| {
            CalendarDate::from_naive(d).map_err(|e| DbError::CorruptRow {
                table: "memberships",
                reason: e.to_string(),
            })
        };
        Ok(Membership {
            id: MembershipId::from_uuid(self.id),
            member_id: MemberId::from_uuid(self.member_id),
            plan_id: PlanId::from_uuid(self.plan_id),
            start_date: date(self.start_date)?,
            end_date: date(self.end_date)?,
            cancelled_at: self.cancelled_at.map(date).transpose()?,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ActiveWithPlanRow {
    #[sqlx(flatten)]
    membership: MembershipRow,
    plan_name: String,
    plan_description: Option<String>,
    plan_price_cents: i32,
    plan_duration_days: i32,
    plan_is_active: bool,
    plan_created_at: DateTime<Utc>,
    plan_updated_at: DateTime<Utc>,
}

impl ActiveWithPlanRow {
    fn into_records(self) -> Result<(Membership, Plan), DbError> {
        let membership = self.membership.into_record()?;
        let plan = Plan {
            id: membership.plan_id,
            name: self.plan_name,
            description: self.plan_description,
            price_cents: self.plan_price_cents,
            duration_days: self.plan_duration_days,
            is_active: self.plan_is_active,
            created_at: self.plan_created_at,
            updated_at: self.plan_updated_at,
        };
        Ok((membership, plan))
    }
}
