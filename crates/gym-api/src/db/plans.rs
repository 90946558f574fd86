//! Plan persistence operations.

use chrono::{DateTime, Utc};
use gym_core::{PageRequest, PlanId};
use gym_state::Plan;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::filters::PlanFilter;
use super::{like_pattern, DbError};

const COLUMNS: &str =
    "id, name, description, price_cents, duration_days, is_active, created_at, updated_at";

pub async fn insert(pool: &PgPool, plan: &Plan) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO plans (id, name, description, price_cents, duration_days, is_active, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(plan.id.as_uuid())
    .bind(&plan.name)
    .bind(plan.description.as_deref())
    .bind(plan.price_cents)
    .bind(plan.duration_days)
    .bind(plan.is_active)
    .bind(plan.created_at)
    .bind(plan.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_by_id(pool: &PgPool, id: PlanId) -> Result<Option<Plan>, DbError> {
    let row = sqlx::query_as::<_, PlanRow>(&format!("SELECT {COLUMNS} FROM plans WHERE id = $1"))
        .bind(id.as_uuid())
        .fetch_optional(pool)
        .await?;
    Ok(row.map(PlanRow::into_record))
}

pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Plan>, DbError> {
    let row = sqlx::query_as::<_, PlanRow>(&format!(
        "SELECT {COLUMNS} FROM plans WHERE name = $1 ORDER BY created_at LIMIT 1"
    ))
    .bind(name)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(PlanRow::into_record))
}

pub async fn list(
    pool: &PgPool,
    filter: &PlanFilter,
    page: PageRequest,
) -> Result<(Vec<Plan>, u64), DbError> {
    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM plans WHERE TRUE");
    push_filters(&mut count, filter);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut select =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM plans WHERE TRUE"));
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

    let rows: Vec<PlanRow> = select.build_query_as().fetch_all(pool).await?;
    Ok((
        rows.into_iter().map(PlanRow::into_record).collect(),
        total.max(0) as u64,
    ))
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &PlanFilter) {
    if let Some(active) = filter.is_active {
        qb.push(" AND is_active = ").push_bind(active);
    }
    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[derive(sqlx::FromRow)]
struct PlanRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    price_cents: i32,
    duration_days: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PlanRow {
    fn into_record(self) -> Plan {
        Plan {
            id: PlanId::from_uuid(self.id),
            name: self.name,
            description: self.description,
            price_cents: self.price_cents,
            duration_days: self.duration_days,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
