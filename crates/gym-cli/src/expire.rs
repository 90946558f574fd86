//! # Expire CLI: Membership expiry sweep.
//!
//! Active memberships stay active past their end date until this sweep
//! runs. A membership is valid through its end date inclusive, so the
//! sweep only touches rows with `end_date < as_of`.
//!
//! Intended to be scheduled daily (cron, Kubernetes CronJob).

use anyhow::Result;
use chrono::Utc;
use clap::Args;

use gym_api::services::memberships::{count_lapsed, expire_lapsed};
use gym_core::CalendarDate;

/// Expire subcommand arguments.
#[derive(Args, Debug)]
pub struct ExpireArgs {
    /// Reference date (YYYY-MM-DD). Defaults to today in UTC.
    #[arg(long)]
    pub as_of: Option<CalendarDate>,

    /// Count lapsed memberships without transitioning them.
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute the expire subcommand.
pub async fn run_expire(args: &ExpireArgs) -> Result<u8> {
    let as_of = args.as_of.unwrap_or_else(CalendarDate::today_utc);
    let db = crate::open_database(true).await?;

    if args.dry_run {
        let lapsed = count_lapsed(&db, as_of).await?;
        println!("{lapsed} membership(s) would expire as of {as_of}.");
        return Ok(0);
    }

    let expired = expire_lapsed(&db, as_of, Utc::now()).await?;
    println!("Expired {expired} membership(s) as of {as_of}.");
    Ok(0)
}
