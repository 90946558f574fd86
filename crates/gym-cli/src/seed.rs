//! # Seed CLI: Provision the default plan catalog.
//!
//! Plans are matched by name. Existing plans are left untouched, so the
//! command can be re-run safely after the catalog grows.

use anyhow::Result;
use chrono::Utc;
use clap::Args;

use gym_api::services::plans::{default_catalog, seed_catalog, SeedReport};

/// Seed subcommand arguments.
#[derive(Args, Debug)]
pub struct SeedArgs {
    /// Report what would be inserted without writing.
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute the seed subcommand.
pub async fn run_seed(args: &SeedArgs) -> Result<u8> {
    let db = crate::open_database(true).await?;
    let report = seed_catalog(&db, default_catalog(), Utc::now(), args.dry_run).await?;
    print!("{}", render_report(&report, args.dry_run));
    Ok(0)
}

fn render_report(report: &SeedReport, dry_run: bool) -> String {
    let verb = if dry_run { "Would insert" } else { "Inserted" };
    let mut out = String::new();
    for name in &report.inserted {
        out.push_str(&format!("  + {name}\n"));
    }
    for name in &report.skipped {
        out.push_str(&format!("  = {name} (exists)\n"));
    }
    out.push_str(&format!(
        "{verb} {} plan(s), skipped {}.\n",
        report.inserted.len(),
        report.skipped.len()
    ));
    out
}
