//! # Persistence Layer
//!
//! Two interchangeable backends behind the [`Database`] enum:
//!
//! - **Postgres** (`sqlx::PgPool`), selected when `DATABASE_URL` is set.
//!   The schema lives in `migrations/` and is applied at startup. Per-table
//!   query functions are in `members`, `plans`, `memberships` and
//!   `check_ins`.
//! - **Memory** ([`memory::MemoryStore`]), used otherwise. Suitable for
//!   development and tests; state does not survive restarts.
//!
//! ## Uniqueness invariants
//!
//! Both backends enforce the same storage-level rules: member email is
//! unique, and a member has at most one `active` membership. In Postgres
//! these are a unique constraint and the partial unique index
//! `idx_memberships_member_active`; the memory store checks and inserts
//! under a single write lock. Violations surface as
//! [`DbError::Constraint`] carrying the matching `DomainError`.

pub mod check_ins;
pub mod filters;
pub mod memberships;
pub mod members;
pub mod memory;
pub mod plans;

use std::time::Duration;

use chrono::{DateTime, Utc};
use gym_core::{CalendarDate, CheckInId, MemberId, MembershipId, PageRequest, PlanId};
use gym_state::{CheckIn, DomainError, Member, Membership, Plan};
use sqlx::postgres::{PgPool, PgPoolOptions};
use thiserror::Error;

pub use filters::{
    CheckInFilter, CheckInSortField, MemberFilter, MemberSortField, MembershipFilter,
    MembershipSortField, PlanFilter, PlanSortField,
};
pub use memory::MemoryStore;

use crate::state::AppConfig;

/// Errors raised by either backend.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("{0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// A storage-level uniqueness rule rejected the write.
    #[error(transparent)]
    Constraint(DomainError),

    /// A stored row could not be mapped back to a domain record.
    #[error("corrupt row in {table}: {reason}")]
    CorruptRow { table: &'static str, reason: String },

    #[error("operation requires a PostgreSQL database")]
    NotPostgres,
}

/// Name of the violated unique constraint, if `err` is a unique violation.
pub(crate) fn unique_violation(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            Some(db.constraint().unwrap_or_default().to_string())
        }
        _ => None,
    }
}

/// Escape `%`, `_` and `\` so user text matches literally inside ILIKE.
pub(crate) fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Connect to PostgreSQL when `DATABASE_URL` is configured.
///
/// Returns `None` if no URL is set (in-memory mode). Returns `Err` if the
/// URL is set but the connection or migration fails.
pub async fn init_pool(config: &AppConfig) -> Result<Option<PgPool>, DbError> {
    let Some(url) = config.database_url.as_deref() else {
        tracing::warn!(
            "DATABASE_URL not set; running in-memory only mode. \
             State will not survive restarts."
        );
        return Ok(None);
    };

    let pool = connect(url, config.database_max_connections).await?;
    migrate(&pool).await?;
    Ok(Some(pool))
}

/// Open a connection pool without running migrations.
pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, DbError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(2.min(max_connections))
        .acquire_timeout(Duration::from_secs(5))
        .connect(url)
        .await?;
    tracing::info!(max_connections, "connected to PostgreSQL");
    Ok(pool)
}

/// Apply embedded migrations.
pub async fn migrate(pool: &PgPool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("database migrations applied");
    Ok(())
}

/// Storage backend shared by all handlers.
#[derive(Debug, Clone)]
pub enum Database {
    Postgres(PgPool),
    Memory(MemoryStore),
}

impl Database {
    /// Postgres when a pool is available, otherwise a fresh memory store.
    pub fn from_pool(pool: Option<PgPool>) -> Self {
        match pool {
            Some(pool) => Self::Postgres(pool),
            None => Self::Memory(MemoryStore::new()),
        }
    }

    pub fn in_memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Memory(_) => "memory",
        }
    }

    /// Round-trip to the backend for readiness probes.
    pub async fn ping(&self) -> Result<(), DbError> {
        match self {
            Self::Postgres(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
                Ok(())
            }
            Self::Memory(_) => Ok(()),
        }
    }

    pub fn pg_pool(&self) -> Result<&PgPool, DbError> {
        match self {
            Self::Postgres(pool) => Ok(pool),
            Self::Memory(_) => Err(DbError::NotPostgres),
        }
    }

    // ── Members ──────────────────────────────────────────────────────

    pub async fn insert_member(&self, member: &Member) -> Result<(), DbError> {
        match self {
            Self::Postgres(pool) => members::insert(pool, member).await,
            Self::Memory(store) => store.insert_member(member),
        }
    }

    pub async fn get_member(&self, id: MemberId) -> Result<Option<Member>, DbError> {
        match self {
            Self::Postgres(pool) => members::get_by_id(pool, id).await,
            Self::Memory(store) => Ok(store.get_member(id)),
        }
    }

    pub async fn list_members(
        &self,
        filter: &MemberFilter,
        page: PageRequest,
    ) -> Result<(Vec<Member>, u64), DbError> {
        match self {
            Self::Postgres(pool) => members::list(pool, filter, page).await,
            Self::Memory(store) => Ok(store.list_members(filter, page)),
        }
    }

    /// Persist a soft deletion. `false` if the member was already deleted.
    pub async fn mark_member_deleted(&self, member: &Member) -> Result<bool, DbError> {
        match self {
            Self::Postgres(pool) => members::mark_deleted(pool, member).await,
            Self::Memory(store) => Ok(store.mark_member_deleted(member)),
        }
    }

    // ── Plans ────────────────────────────────────────────────────────

    pub async fn insert_plan(&self, plan: &Plan) -> Result<(), DbError> {
        match self {
            Self::Postgres(pool) => plans::insert(pool, plan).await,
            Self::Memory(store) => {
                store.insert_plan(plan);
                Ok(())
            }
        }
    }

    pub async fn get_plan(&self, id: PlanId) -> Result<Option<Plan>, DbError> {
        match self {
            Self::Postgres(pool) => plans::get_by_id(pool, id).await,
            Self::Memory(store) => Ok(store.get_plan(id)),
        }
    }

    pub async fn find_plan_by_name(&self, name: &str) -> Result<Option<Plan>, DbError> {
        match self {
            Self::Postgres(pool) => plans::find_by_name(pool, name).await,
            Self::Memory(store) => Ok(store.find_plan_by_name(name)),
        }
    }

    pub async fn list_plans(
        &self,
        filter: &PlanFilter,
        page: PageRequest,
    ) -> Result<(Vec<Plan>, u64), DbError> {
        match self {
            Self::Postgres(pool) => plans::list(pool, filter, page).await,
            Self::Memory(store) => Ok(store.list_plans(filter, page)),
        }
    }

    // ── Memberships ──────────────────────────────────────────────────

    /// Insert a membership. A second active membership for the same member
    /// fails with `ActiveMembershipExists`.
    pub async fn insert_membership(&self, membership: &Membership) -> Result<(), DbError> {
        match self {
            Self::Postgres(pool) => memberships::insert(pool, membership).await,
            Self::Memory(store) => store.insert_membership(membership),
        }
    }

    pub async fn get_membership(&self, id: MembershipId) -> Result<Option<Membership>, DbError> {
        match self {
            Self::Postgres(pool) => memberships::get_by_id(pool, id).await,
            Self::Memory(store) => Ok(store.get_membership(id)),
        }
    }

    pub async fn find_active_membership(
        &self,
        member_id: MemberId,
    ) -> Result<Option<Membership>, DbError> {
        match self {
            Self::Postgres(pool) => memberships::find_active_for_member(pool, member_id).await,
            Self::Memory(store) => Ok(store.find_active_membership(member_id)),
        }
    }

    /// The member's active membership together with its plan.
    pub async fn find_active_membership_with_plan(
        &self,
        member_id: MemberId,
    ) -> Result<Option<(Membership, Plan)>, DbError> {
        match self {
            Self::Postgres(pool) => memberships::find_active_with_plan(pool, member_id).await,
            Self::Memory(store) => Ok(store.find_active_membership_with_plan(member_id)),
        }
    }

    pub async fn list_memberships(
        &self,
        filter: &MembershipFilter,
        page: PageRequest,
    ) -> Result<(Vec<Membership>, u64), DbError> {
        match self {
            Self::Postgres(pool) => memberships::list(pool, filter, page).await,
            Self::Memory(store) => Ok(store.list_memberships(filter, page)),
        }
    }

    /// Persist a status transition of a membership that is still `active`
    /// in storage. `false` if a concurrent writer got there first.
    pub async fn save_membership_transition(
        &self,
        membership: &Membership,
    ) -> Result<bool, DbError> {
        match self {
            Self::Postgres(pool) => memberships::save_transition(pool, membership).await,
            Self::Memory(store) => Ok(store.save_membership_transition(membership)),
        }
    }

    /// Number of active memberships whose end date is before `as_of`.
    pub async fn count_lapsed_memberships(&self, as_of: CalendarDate) -> Result<u64, DbError> {
        match self {
            Self::Postgres(pool) => memberships::count_lapsed(pool, as_of).await,
            Self::Memory(store) => Ok(store.count_lapsed_memberships(as_of)),
        }
    }

    /// Transition every lapsed active membership to `expired`.
    pub async fn expire_lapsed_memberships(
        &self,
        as_of: CalendarDate,
        now: DateTime<Utc>,
    ) -> Result<u64, DbError> {
        match self {
            Self::Postgres(pool) => memberships::expire_lapsed(pool, as_of, now).await,
            Self::Memory(store) => Ok(store.expire_lapsed_memberships(as_of, now)),
        }
    }

    // ── Check-ins ────────────────────────────────────────────────────

    pub async fn insert_check_in(&self, check_in: &CheckIn) -> Result<(), DbError> {
        match self {
            Self::Postgres(pool) => check_ins::insert(pool, check_in).await,
            Self::Memory(store) => {
                store.insert_check_in(check_in);
                Ok(())
            }
        }
    }

    pub async fn get_check_in(&self, id: CheckInId) -> Result<Option<CheckIn>, DbError> {
        match self {
            Self::Postgres(pool) => check_ins::get_by_id(pool, id).await,
            Self::Memory(store) => Ok(store.get_check_in(id)),
        }
    }

    pub async fn list_check_ins(
        &self,
        filter: &CheckInFilter,
        page: PageRequest,
    ) -> Result<(Vec<CheckIn>, u64), DbError> {
        match self {
            Self::Postgres(pool) => check_ins::list(pool, filter, page).await,
            Self::Memory(store) => Ok(store.list_check_ins(filter, page)),
        }
    }

    pub async fn last_check_in_at(
        &self,
        member_id: MemberId,
    ) -> Result<Option<DateTime<Utc>>, DbError> {
        match self {
            Self::Postgres(pool) => check_ins::last_for_member(pool, member_id).await,
            Self::Memory(store) => Ok(store.last_check_in_at(member_id)),
        }
    }

    pub async fn count_check_ins_since(
        &self,
        member_id: MemberId,
        since: DateTime<Utc>,
    ) -> Result<u64, DbError> {
        match self {
            Self::Postgres(pool) => check_ins::count_since(pool, member_id, since).await,
            Self::Memory(store) => Ok(store.count_check_ins_since(member_id, since)),
        }
    }
}
