// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQLite-backed implementation of the storage traits.
//!
//! Provides operations for:
//! - Users (profile and password hash)
//! - Tokens (hashed bearer tokens)
//! - Workouts (parent row plus ordered entries, written transactionally)

use super::{StorageError, TokenStore, UserStore, WorkoutStore};
use crate::models::{
    NewWorkout, NewWorkoutEntry, TokenRecord, User, Workout, WorkoutEntry, WorkoutUpdate,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{SqliteConnection, SqlitePool};
use std::str::FromStr;

/// Idempotent schema bootstrap.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    bio TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tokens (
    hash TEXT PRIMARY KEY,
    user_id INTEGER NOT NULL,
    expiry INTEGER NOT NULL,
    scope TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tokens_user ON tokens(user_id);
CREATE INDEX IF NOT EXISTS idx_tokens_expiry ON tokens(expiry);

CREATE TABLE IF NOT EXISTS workouts (
    id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    duration_minutes INTEGER NOT NULL CHECK (duration_minutes >= 0),
    calories_burned INTEGER NOT NULL CHECK (calories_burned >= 0)
);

CREATE INDEX IF NOT EXISTS idx_workouts_user ON workouts(user_id);

CREATE TABLE IF NOT EXISTS workout_entries (
    id INTEGER PRIMARY KEY,
    workout_id INTEGER NOT NULL REFERENCES workouts(id) ON DELETE CASCADE,
    exercise_name TEXT NOT NULL,
    sets INTEGER NOT NULL CHECK (sets >= 0),
    reps INTEGER CHECK (reps >= 0),
    weight REAL CHECK (weight >= 0),
    notes TEXT NOT NULL DEFAULT '',
    order_index INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_workout_entries_workout ON workout_entries(workout_id, order_index);
"#;

/// Parent row of a workout.
#[derive(sqlx::FromRow)]
struct WorkoutRow {
    id: i64,
    user_id: i64,
    title: String,
    description: String,
    duration_minutes: i32,
    calories_burned: i32,
}

impl WorkoutRow {
    fn into_workout(self, entries: Vec<WorkoutEntry>) -> Workout {
        Workout {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            description: self.description,
            duration_minutes: self.duration_minutes,
            calories_burned: self.calories_burned,
            entries,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TokenRow {
    hash: String,
    user_id: i64,
    expiry: i64,
    scope: String,
}

impl TryFrom<TokenRow> for TokenRecord {
    type Error = StorageError;

    fn try_from(row: TokenRow) -> Result<Self, Self::Error> {
        let expiry = DateTime::from_timestamp(row.expiry, 0).ok_or_else(|| {
            StorageError::Backend(format!("token expiry out of range: {}", row.expiry))
        })?;
        Ok(TokenRecord {
            hash: row.hash,
            user_id: row.user_id,
            expiry,
            scope: row.scope,
        })
    }
}

/// SQLite database handle; cheap to clone.
#[derive(Clone)]
pub struct SqliteDb {
    pool: SqlitePool,
}

impl SqliteDb {
    /// Connect to `url`, creating the database file if needed.
    ///
    /// In-memory databases live only as long as their connection, so they
    /// are pinned to one connection that is never recycled.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };

        let pool = pool_options.connect_with(options).await?;
        tracing::info!(url, in_memory, "Connected to SQLite");

        Ok(Self { pool })
    }

    /// Fresh, migrated in-memory database.
    pub async fn in_memory() -> Result<Self, StorageError> {
        let db = Self::connect("sqlite::memory:", 1).await?;
        db.migrate().await?;
        Ok(db)
    }

    /// Create tables and indexes if they do not exist yet.
    pub async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        tracing::info!("Database schema ready");
        Ok(())
    }

    /// Underlying pool, for health checks and tests.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// ─── Workout helpers ─────────────────────────────────────────

async fn insert_entries(
    conn: &mut SqliteConnection,
    workout_id: i64,
    entries: &[NewWorkoutEntry],
) -> Result<(), StorageError> {
    for (order_index, entry) in entries.iter().enumerate() {
        sqlx::query(
            "INSERT INTO workout_entries \
             (workout_id, exercise_name, sets, reps, weight, notes, order_index) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(workout_id)
        .bind(&entry.exercise_name)
        .bind(entry.sets)
        .bind(entry.reps)
        .bind(entry.weight)
        .bind(&entry.notes)
        .bind(order_index as i64)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn load_entries(
    conn: &mut SqliteConnection,
    workout_id: i64,
) -> Result<Vec<WorkoutEntry>, StorageError> {
    let entries = sqlx::query_as::<_, WorkoutEntry>(
        "SELECT id, workout_id, exercise_name, sets, reps, weight, notes, order_index \
         FROM workout_entries WHERE workout_id = ? ORDER BY order_index, id",
    )
    .bind(workout_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(entries)
}

async fn load_workout(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<Workout>, StorageError> {
    let row = sqlx::query_as::<_, WorkoutRow>(
        "SELECT id, user_id, title, description, duration_minutes, calories_burned \
         FROM workouts WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => {
            let entries = load_entries(conn, row.id).await?;
            Ok(Some(row.into_workout(entries)))
        }
        None => Ok(None),
    }
}

// ─── User Operations ─────────────────────────────────────────

#[async_trait]
impl UserStore for SqliteDb {
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        bio: &str,
        now: DateTime<Utc>,
    ) -> Result<User, StorageError> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (username, email, password_hash, bio, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?) \
             RETURNING id, username, email, password_hash, bio, created_at, updated_at",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(bio)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(user_id = user.id, "User inserted");
        Ok(user)
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, StorageError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, bio, created_at, updated_at \
             FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, bio, created_at, updated_at \
             FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

// ─── Token Operations ────────────────────────────────────────

#[async_trait]
impl TokenStore for SqliteDb {
    async fn insert_token(&self, record: &TokenRecord) -> Result<(), StorageError> {
        sqlx::query("INSERT INTO tokens (hash, user_id, expiry, scope) VALUES (?, ?, ?, ?)")
            .bind(&record.hash)
            .bind(record.user_id)
            .bind(record.expiry.timestamp())
            .bind(&record.scope)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_token(&self, hash: &str) -> Result<Option<TokenRecord>, StorageError> {
        sqlx::query_as::<_, TokenRow>(
            "SELECT hash, user_id, expiry, scope FROM tokens WHERE hash = ?",
        )
        .bind(hash)
        .fetch_optional(&self.pool)
        .await?
        .map(TokenRecord::try_from)
        .transpose()
    }

    async fn delete_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM tokens WHERE expiry < ?")
            .bind(now.timestamp())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_tokens_for_user(
        &self,
        user_id: i64,
        scope: &str,
    ) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM tokens WHERE user_id = ? AND scope = ?")
            .bind(user_id)
            .bind(scope)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

// ─── Workout Operations ──────────────────────────────────────

#[async_trait]
impl WorkoutStore for SqliteDb {
    async fn create_workout(
        &self,
        owner_id: i64,
        workout: &NewWorkout,
    ) -> Result<Workout, StorageError> {
        // Dropping the transaction on any early return rolls it back.
        let mut tx = self.pool.begin().await?;

        let workout_id = sqlx::query(
            "INSERT INTO workouts (user_id, title, description, duration_minutes, calories_burned) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(owner_id)
        .bind(&workout.title)
        .bind(&workout.description)
        .bind(workout.duration_minutes)
        .bind(workout.calories_burned)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        insert_entries(&mut tx, workout_id, &workout.entries).await?;

        let created = load_workout(&mut tx, workout_id)
            .await?
            .ok_or(StorageError::NotFound)?;

        tx.commit().await?;

        tracing::debug!(
            workout_id,
            owner_id,
            entries = created.entries.len(),
            "Workout created"
        );
        Ok(created)
    }

    async fn get_workout(&self, id: i64) -> Result<Option<Workout>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        load_workout(&mut conn, id).await
    }

    async fn get_workout_owner(&self, id: i64) -> Result<i64, StorageError> {
        let owner: Option<i64> = sqlx::query_scalar("SELECT user_id FROM workouts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        owner.ok_or(StorageError::NotFound)
    }

    async fn list_workouts_for_user(&self, owner_id: i64) -> Result<Vec<Workout>, StorageError> {
        let mut conn = self.pool.acquire().await?;

        let rows = sqlx::query_as::<_, WorkoutRow>(
            "SELECT id, user_id, title, description, duration_minutes, calories_burned \
             FROM workouts WHERE user_id = ? ORDER BY id",
        )
        .bind(owner_id)
        .fetch_all(&mut *conn)
        .await?;

        let mut workouts = Vec::with_capacity(rows.len());
        for row in rows {
            let entries = load_entries(&mut conn, row.id).await?;
            workouts.push(row.into_workout(entries));
        }
        Ok(workouts)
    }

    async fn update_workout(
        &self,
        id: i64,
        changes: &WorkoutUpdate,
    ) -> Result<Workout, StorageError> {
        let mut tx = self.pool.begin().await?;

        // NULL binds leave the column as it was.
        let result = sqlx::query(
            "UPDATE workouts SET \
               title = COALESCE(?, title), \
               description = COALESCE(?, description), \
               duration_minutes = COALESCE(?, duration_minutes), \
               calories_burned = COALESCE(?, calories_burned) \
             WHERE id = ?",
        )
        .bind(changes.title.as_deref())
        .bind(changes.description.as_deref())
        .bind(changes.duration_minutes)
        .bind(changes.calories_burned)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        if let Some(entries) = &changes.entries {
            sqlx::query("DELETE FROM workout_entries WHERE workout_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            insert_entries(&mut tx, id, entries).await?;
        }

        let updated = load_workout(&mut tx, id)
            .await?
            .ok_or(StorageError::NotFound)?;

        tx.commit().await?;

        tracing::debug!(
            workout_id = id,
            entries_replaced = changes.entries.is_some(),
            "Workout updated"
        );
        Ok(updated)
    }

    async fn delete_workout(&self, id: i64) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM workouts WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        tx.commit().await?;

        tracing::debug!(workout_id = id, "Workout deleted");
        Ok(())
    }
}
