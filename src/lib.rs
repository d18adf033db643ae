// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout Tracker: bearer-token authenticated workout logging.
//!
//! This crate provides the backend API for registering users, issuing
//! opaque session tokens and storing workouts owned by those users.

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::SqliteDb;
use services::{CredentialVerifier, TokenService, WorkoutService};
use std::sync::Arc;
use time_utils::{Clock, SystemClock};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: SqliteDb,
    pub credentials: CredentialVerifier,
    pub tokens: TokenService,
    pub workouts: WorkoutService,
}

impl AppState {
    /// Wire all services against one database using the system clock.
    pub fn new(config: Config, db: SqliteDb) -> Self {
        Self::with_clock(config, db, Arc::new(SystemClock))
    }

    /// Wire all services with an explicit clock (tests use `ManualClock`).
    pub fn with_clock(config: Config, db: SqliteDb, clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(db.clone());

        Self {
            credentials: CredentialVerifier::new(store.clone(), clock.clone()),
            tokens: TokenService::new(store.clone(), store.clone(), clock),
            workouts: WorkoutService::new(store),
            config,
            db,
        }
    }
}
