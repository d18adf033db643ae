// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout Tracker API Server
//!
//! Registers users, issues bearer tokens and stores workouts that only
//! their owners may change.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use workout_tracker::{config::Config, db::SqliteDb, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Workout Tracker API");

    // Open the database and make sure the schema exists
    let db = SqliteDb::connect(&config.database_url, config.database_max_connections)
        .await
        .expect("Failed to connect to database");
    db.migrate().await.expect("Failed to prepare database schema");

    let state = Arc::new(AppState::new(config.clone(), db));

    // Expired token sweep (frequency is configurable; 0 disables it)
    match config.token_sweep_interval {
        Some(interval) => {
            state.tokens.clone().spawn_expiry_sweeper(interval);
            tracing::info!(
                interval_secs = interval.as_secs(),
                "Expired token sweeper started"
            );
        }
        None => tracing::info!("Expired token sweeper disabled"),
    }

    // Build router
    let app = workout_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("workout_tracker=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
