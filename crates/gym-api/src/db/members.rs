//! Member persistence operations.

use chrono::{DateTime, Utc};
use gym_core::{Email, MemberId, PageRequest, Phone};
use gym_state::{DomainError, Member};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::filters::MemberFilter;
use super::{like_pattern, unique_violation, DbError};

const COLUMNS: &str =
    "id, first_name, last_name, email, phone, is_deleted, created_at, updated_at";

/// Unique constraint on the normalized email column.
pub(crate) const EMAIL_CONSTRAINT: &str = "members_email_key";

/// Insert a new member. A taken email maps to `EmailAlreadyExists`.
pub async fn insert(pool: &PgPool, member: &Member) -> Result<(), DbError> {
    let result = sqlx::query(
        "INSERT INTO members (id, first_name, last_name, email, phone, is_deleted, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(member.id.as_uuid())
    .bind(&member.first_name)
    .bind(&member.last_name)
    .bind(member.email.as_str())
    .bind(member.phone.as_ref().map(Phone::as_str))
    .bind(member.is_deleted)
    .bind(member.created_at)
    .bind(member.updated_at)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(e) if unique_violation(&e).as_deref() == Some(EMAIL_CONSTRAINT) => Err(
            DbError::Constraint(DomainError::EmailAlreadyExists(member.email.to_string())),
        ),
        Err(e) => Err(e.into()),
    }
}

pub async fn get_by_id(pool: &PgPool, id: MemberId) -> Result<Option<Member>, DbError> {
    let row = sqlx::query_as::<_, MemberRow>(&format!(
        "SELECT {COLUMNS} FROM members WHERE id = $1"
    ))
    .bind(id.as_uuid())
    .fetch_optional(pool)
    .await?;
    row.map(MemberRow::into_record).transpose()
}

/// One page of members plus the total number of matches.
pub async fn list(
    pool: &PgPool,
    filter: &MemberFilter,
    page: PageRequest,
) -> Result<(Vec<Member>, u64), DbError> {
    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM members WHERE TRUE");
    push_filters(&mut count, filter);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut select = QueryBuilder::<Postgres>::new(format!(
        "SELECT {COLUMNS} FROM members WHERE TRUE"
    ));
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

    let rows: Vec<MemberRow> = select.build_query_as().fetch_all(pool).await?;
    let members = rows
        .into_iter()
        .map(MemberRow::into_record)
        .collect::<Result<Vec<_>, _>>()?;
    Ok((members, total.max(0) as u64))
}

/// Flip `is_deleted`. `false` if the member was already deleted.
pub async fn mark_deleted(pool: &PgPool, member: &Member) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE members SET is_deleted = TRUE, updated_at = $2
         WHERE id = $1 AND is_deleted = FALSE",
    )
    .bind(member.id.as_uuid())
    .bind(member.updated_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &MemberFilter) {
    if !filter.include_deleted {
        qb.push(" AND is_deleted = FALSE");
    }
    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        qb.push(" AND (first_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR last_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

// -- Row type -----------------------------------------------------------------

#[derive(sqlx::FromRow)]
struct MemberRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
    is_deleted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MemberRow {
    fn into_record(self) -> Result<Member, DbError> {
        let corrupt = |reason: String| DbError::CorruptRow {
            table: "members",
            reason,
        };
        Ok(Member {
            id: MemberId::from_uuid(self.id),
            first_name: self.first_name,
            last_name: self.last_name,
            email: Email::parse(&self.email).map_err(|e| corrupt(e.to_string()))?,
            phone: self
                .phone
                .map(|p| Phone::parse(&p))
                .transpose()
                .map_err(|e| corrupt(e.to_string()))?,
            is_deleted: self.is_deleted,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
