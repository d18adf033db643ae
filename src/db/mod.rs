// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (SQLite via sqlx).
//!
//! Storage is expressed as three capability traits so that services depend
//! on what they use rather than on a concrete backend. [`SqliteDb`]
//! implements all of them.

pub mod sqlite;

pub use sqlite::SqliteDb;

use crate::models::{NewWorkout, TokenRecord, User, Workout, WorkoutUpdate};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;

/// Storage failures, kept separate from "row not present".
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Record not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Conflict(String),

    #[error("Transient storage failure: {0}")]
    Transient(String),

    #[error("Storage failure: {0}")]
    Backend(String),
}

impl StorageError {
    /// Whether retrying the whole operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Transient(_))
    }
}

// SQLite primary result codes for lock contention.
const SQLITE_BUSY: &str = "5";
const SQLITE_LOCKED: &str = "6";

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StorageError::NotFound,
            sqlx::Error::PoolTimedOut => StorageError::Transient(err.to_string()),
            sqlx::Error::Database(ref db_err) => {
                if db_err.is_unique_violation() {
                    return StorageError::Conflict(db_err.message().to_string());
                }
                let code = db_err.code();
                let code = code.as_deref().unwrap_or_default();
                // Extended codes share the primary code in their low byte.
                let primary = code
                    .parse::<u32>()
                    .map(|c| (c & 0xff).to_string())
                    .unwrap_or_default();
                if primary == SQLITE_BUSY || primary == SQLITE_LOCKED {
                    StorageError::Transient(db_err.message().to_string())
                } else {
                    StorageError::Backend(db_err.message().to_string())
                }
            }
            other => StorageError::Backend(other.to_string()),
        }
    }
}

/// User lookup and creation.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user whose password has already been hashed.
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        bio: &str,
        now: DateTime<Utc>,
    ) -> Result<User, StorageError>;

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, StorageError>;

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError>;
}

/// Token hash persistence.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn insert_token(&self, record: &TokenRecord) -> Result<(), StorageError>;

    async fn get_token(&self, hash: &str) -> Result<Option<TokenRecord>, StorageError>;

    /// Delete tokens whose expiry is before `now`; returns how many went.
    async fn delete_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64, StorageError>;

    async fn delete_tokens_for_user(&self, user_id: i64, scope: &str)
        -> Result<u64, StorageError>;
}

/// Transactional persistence for the workout aggregate.
///
/// Implementations do not check ownership; callers must do that through
/// [`WorkoutStore::get_workout_owner`] before mutating.
#[async_trait]
pub trait WorkoutStore: Send + Sync {
    /// Insert the parent and every entry atomically.
    async fn create_workout(
        &self,
        owner_id: i64,
        workout: &NewWorkout,
    ) -> Result<Workout, StorageError>;

    /// `Ok(None)` when the workout does not exist.
    async fn get_workout(&self, id: i64) -> Result<Option<Workout>, StorageError>;

    /// Owner of the workout, or `StorageError::NotFound`.
    async fn get_workout_owner(&self, id: i64) -> Result<i64, StorageError>;

    async fn list_workouts_for_user(&self, owner_id: i64) -> Result<Vec<Workout>, StorageError>;

    /// Apply present fields and, if given, replace the whole entry set.
    async fn update_workout(
        &self,
        id: i64,
        changes: &WorkoutUpdate,
    ) -> Result<Workout, StorageError>;

    /// Delete the workout; entries go with it.
    async fn delete_workout(&self, id: i64) -> Result<(), StorageError>;
}

const MAX_TRANSIENT_RETRIES: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(25);

/// Run `op`, retrying with linear backoff while it fails transiently.
pub async fn retry_transient<T, F, Fut>(label: &'static str, mut op: F) -> Result<T, StorageError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StorageError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Err(err) if err.is_transient() && attempt < MAX_TRANSIENT_RETRIES => {
                attempt += 1;
                tracing::warn!(
                    operation = label,
                    attempt,
                    error = %err,
                    "Transient storage failure, retrying"
                );
                tokio::time::sleep(RETRY_BASE_DELAY * attempt).await;
            }
            result => return result,
        }
    }
}
