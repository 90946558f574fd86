//! Check-in persistence operations.

use chrono::{DateTime, Utc};
use gym_core::{CheckInId, MemberId, MembershipId, PageRequest};
use gym_state::CheckIn;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::filters::CheckInFilter;
use super::DbError;

const COLUMNS: &str = "id, member_id, membership_id, checked_in_at";

pub async fn insert(pool: &PgPool, check_in: &CheckIn) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO check_ins (id, member_id, membership_id, checked_in_at)
         VALUES ($1, $2, $3, $4)",
    )
    .bind(check_in.id.as_uuid())
    .bind(check_in.member_id.as_uuid())
    .bind(check_in.membership_id.as_uuid())
    .bind(check_in.checked_in_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_by_id(pool: &PgPool, id: CheckInId) -> Result<Option<CheckIn>, DbError> {
    let row = sqlx::query_as::<_, CheckInRow>(&format!(
        "SELECT {COLUMNS} FROM check_ins WHERE id = $1"
    ))
    .bind(id.as_uuid())
    .fetch_optional(pool)
    .await?;
    Ok(row.map(CheckInRow::into_record))
}

pub async fn list(
    pool: &PgPool,
    filter: &CheckInFilter,
    page: PageRequest,
) -> Result<(Vec<CheckIn>, u64), DbError> {
    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM check_ins WHERE TRUE");
    push_filters(&mut count, filter);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut select =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM check_ins WHERE TRUE"));
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

    let rows: Vec<CheckInRow> = select.build_query_as().fetch_all(pool).await?;
    Ok((
        rows.into_iter().map(CheckInRow::into_record).collect(),
        total.max(0) as u64,
    ))
}

/// Most recent check-in instant for a member.
pub async fn last_for_member(
    pool: &PgPool,
    member_id: MemberId,
) -> Result<Option<DateTime<Utc>>, DbError> {
    let last: Option<DateTime<Utc>> =
        sqlx::query_scalar("SELECT MAX(checked_in_at) FROM check_ins WHERE member_id = $1")
            .bind(member_id.as_uuid())
            .fetch_one(pool)
            .await?;
    Ok(last)
}

pub async fn count_since(
    pool: &PgPool,
    member_id: MemberId,
    since: DateTime<Utc>,
) -> Result<u64, DbError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM check_ins WHERE member_id = $1 AND checked_in_at >= $2",
    )
    .bind(member_id.as_uuid())
    .bind(since)
    .fetch_one(pool)
    .await?;
    Ok(count.max(0) as u64)
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &CheckInFilter) {
    if let Some(id) = filter.member_id {
        qb.push(" AND member_id = ").push_bind(*id.as_uuid());
    }
    if let Some(id) = filter.membership_id {
        qb.push(" AND membership_id = ").push_bind(*id.as_uuid());
    }
    if let Some(from) = filter.date_from {
        qb.push(" AND checked_in_at >= ").push_bind(from.start_of_day());
    }
    if let Some(to) = filter.date_to {
        qb.push(" AND checked_in_at <= ").push_bind(to.end_of_day());
    }
}

#[derive(sqlx::FromRow)]
struct CheckInRow {
    id: Uuid,
    member_id: Uuid,
    membership_id: Uuid,
    checked_in_at: DateTime<Utc>,
}

impl CheckInRow {
    fn into_record(self) -> CheckIn {
        CheckIn {
            id: CheckInId::from_uuid(self.id),
            member_id: MemberId::from_uuid(self.member_id),
            membership_id: MembershipId::from_uuid(self.membership_id),
            checked_in_at: self.checked_in_at,
        }
    }
}
