//! # gym-cli: Operator CLI for the Gym Membership Stack
//!
//! Provides the `gym` command-line interface for tasks that run outside the
//! request path.
//!
//! ## Subcommands
//!
//! - `gym migrate`: Apply the embedded schema migrations.
//! - `gym seed`: Insert the default plan catalog, skipping existing names.
//! - `gym expire`: Move lapsed active memberships to `expired`.
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/gym gym migrate
//! DATABASE_URL=postgres://localhost/gym gym seed --dry-run
//! DATABASE_URL=postgres://localhost/gym gym expire --as-of 2024-06-01
//! ```

pub mod expire;
pub mod migrate;
pub mod seed;

use anyhow::{Context, Result};
use gym_api::db::{self, Database};
use gym_api::state::AppConfig;

/// Read configuration from the environment and connect to PostgreSQL.
///
/// Every subcommand operates on persistent state, so `DATABASE_URL` is
/// required. Migrations are applied unless `migrate` is false.
pub async fn open_database(migrate: bool) -> Result<Database> {
    let config = AppConfig::from_env()
        .map_err(anyhow::Error::msg)
        .context("invalid configuration")?;
    let url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set")?;

    let pool = db::connect(url, config.database_max_connections)
        .await
        .context("failed to connect to PostgreSQL")?;
    if migrate {
        db::migrate(&pool).await.context("failed to apply migrations")?;
    }
    Ok(Database::from_pool(Some(pool)))
}
