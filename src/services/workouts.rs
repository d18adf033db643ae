// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout use cases with ownership enforcement.
//!
//! Every mutation first probes the owner with `get_workout_owner` and
//! refuses before touching the aggregate if the caller is not the owner.

use crate::db::{retry_transient, StorageError, WorkoutStore};
use crate::error::{AppError, Result};
use crate::models::{NewWorkout, User, Workout, WorkoutUpdate};
use std::sync::Arc;

#[derive(Clone)]
pub struct WorkoutService {
    store: Arc<dyn WorkoutStore>,
}

impl WorkoutService {
    pub fn new(store: Arc<dyn WorkoutStore>) -> Self {
        Self { store }
    }

    /// Create a workout owned by `owner`.
    pub async fn create(&self, owner: &User, workout: &NewWorkout) -> Result<Workout> {
        let store = &self.store;
        let created = retry_transient("create_workout", move || {
            store.create_workout(owner.id, workout)
        })
        .await?;

        tracing::info!(
            user_id = owner.id,
            workout_id = created.id,
            entries = created.entries.len(),
            "Workout created"
        );
        Ok(created)
    }

    pub async fn get(&self, id: i64) -> Result<Workout> {
        let store = &self.store;
        retry_transient("get_workout", move || store.get_workout(id))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Workout {} not found", id)))
    }

    pub async fn list_for(&self, owner: &User) -> Result<Vec<Workout>> {
        let store = &self.store;
        Ok(retry_transient("list_workouts", move || store.list_workouts_for_user(owner.id)).await?)
    }

    /// Apply `changes` to a workout the caller owns.
    pub async fn update(&self, caller: &User, id: i64, changes: &WorkoutUpdate) -> Result<Workout> {
        self.authorize(caller, id).await?;

        let store = &self.store;
        let updated =
            retry_transient("update_workout", move || store.update_workout(id, changes)).await?;

        tracing::info!(user_id = caller.id, workout_id = id, "Workout updated");
        Ok(updated)
    }

    /// Delete a workout the caller owns, together with its entries.
    pub async fn delete(&self, caller: &User, id: i64) -> Result<()> {
        self.authorize(caller, id).await?;

        let store = &self.store;
        retry_transient("delete_workout", move || store.delete_workout(id)).await?;

        tracing::info!(user_id = caller.id, workout_id = id, "Workout deleted");
        Ok(())
    }

    /// Fail unless `caller` owns workout `id`. Not retried past transient errors.
    async fn authorize(&self, caller: &User, id: i64) -> Result<()> {
        let store = &self.store;
        let owner = retry_transient("get_workout_owner", move || store.get_workout_owner(id))
            .await
            .map_err(|e| match e {
                StorageError::NotFound => AppError::NotFound(format!("Workout {} not found", id)),
                other => other.into(),
            })?;

        if owner != caller.id {
            tracing::warn!(
                user_id = caller.id,
                owner_id = owner,
                workout_id = id,
                "Rejected mutation of another user's workout"
            );
            return Err(AppError::Forbidden(
                "You do not own this workout".to_string(),
            ));
        }
        Ok(())
    }
}
