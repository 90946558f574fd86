//! # gym-api: Binary Entry Point
//!
//! Starts the Axum HTTP server for the gym membership API.
//! Binds to configurable port (default 8080).

use anyhow::Context;
use gym_api::db::{self, Database};
use gym_api::state::{AppConfig, AppState};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::from_env()
        .map_err(anyhow::Error::msg)
        .context("invalid configuration")?;
    tracing::info!(?config, "configuration loaded");

    // Database pool is optional; absent means in-memory only.
    let pool = db::init_pool(&config).await.map_err(|e| {
        tracing::error!(error = %e, "database initialization failed");
        e
    })?;
    let database = Database::from_pool(pool);

    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")?;

    let port = config.port;
    let state = AppState::new(database, config).with_metrics(metrics);
    tracing::info!(
        backend = state.db.backend_name(),
        environment = state.config.environment.as_str(),
        "application state ready"
    );

    let app = gym_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("gym API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

/// Structured tracing. `RUST_LOG` overrides the default `info` filter;
/// `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
