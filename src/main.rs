// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Run Tracker web server.

use runtracker::{
    cache::RunCache, config::Config, db::Datastore, identity::IdentitySource, services::RunLog,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        datastore = ?config.datastore,
        dev_login = config.identity.dev_login_enabled(),
        "Starting Run Tracker"
    );

    let identity = IdentitySource::from_config(&config.identity)?;

    let db = Datastore::connect(&config).await?;

    let cache = RunCache::new(config.cache_max_entries);
    tracing::info!(max_entries = config.cache_max_entries, "Run cache initialized");

    let state = Arc::new(AppState {
        config: config.clone(),
        identity,
        run_log: RunLog::new(db, cache),
    });

    // Build router
    let app = runtracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("runtracker=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .try_init()?;
    Ok(())
}
