//! `gym migrate`: apply embedded schema migrations.

use anyhow::Result;
use clap::Args;

/// Migrate subcommand arguments.
#[derive(Args, Debug)]
pub struct MigrateArgs {}

/// Execute the migrate subcommand.
pub async fn run_migrate(_args: &MigrateArgs) -> Result<u8> {
    crate::open_database(true).await?;
    println!("Migrations applied.");
    Ok(0)
}
