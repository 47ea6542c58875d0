//! On-Call Access Checker
//!
//! HTTP service answering `POST /api/check-access`.
//! Okta and AWS credentials come from the environment; without them the
//! service runs against the mock user table.

use access_checker::{lookups, router, AccessChecker, AppState, Config};
use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::parse();

    let default_level = if config.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .json()
        .init();

    info!("Starting On-Call Access Checker");

    let lookups = lookups::build(&config).context("Failed to initialize access lookups")?;
    let state = AppState {
        checker: AccessChecker::from_lookups(lookups),
    };

    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Access checker listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
