//! # gym CLI entry point
//!
//! Parses command-line arguments, configures logging from the verbosity
//! flag, and dispatches to subcommand handlers on a Tokio runtime.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use gym_cli::expire::{run_expire, ExpireArgs};
use gym_cli::migrate::{run_migrate, MigrateArgs};
use gym_cli::seed::{run_seed, SeedArgs};

/// Gym membership stack operator CLI.
///
/// Connects to the database named by `DATABASE_URL` and runs maintenance
/// tasks that sit outside the HTTP API.
#[derive(Parser, Debug)]
#[command(name = "gym", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply embedded schema migrations.
    Migrate(MigrateArgs),

    /// Insert the default plan catalog.
    Seed(SeedArgs),

    /// Expire active memberships whose end date has passed.
    Expire(ExpireArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("failed to start async runtime: {e}");
            return ExitCode::from(1);
        }
    };

    let result = runtime.block_on(async {
        match &cli.command {
            Commands::Migrate(args) => run_migrate(args).await,
            Commands::Seed(args) => run_seed(args).await,
            Commands::Expire(args) => run_expire(args).await,
        }
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
