// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Workout aggregate: a parent row and its ordered entries.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Stored workout with its entries in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workout {
    pub id: i64,
    /// Owner; fixed at creation
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub duration_minutes: i32,
    pub calories_burned: i32,
    pub entries: Vec<WorkoutEntry>,
}

/// One exercise line inside a workout.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct WorkoutEntry {
    pub id: i64,
    pub workout_id: i64,
    pub exercise_name: String,
    pub sets: i32,
    pub reps: Option<i32>,
    pub weight: Option<f64>,
    pub notes: String,
    pub order_index: i32,
}

/// Entry as supplied by a client, before it has an id.
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct NewWorkoutEntry {
    #[validate(length(min = 1, max = 100))]
    pub exercise_name: String,
    #[validate(range(min = 0))]
    pub sets: i32,
    #[validate(range(min = 0))]
    pub reps: Option<i32>,
    #[validate(range(min = 0.0))]
    pub weight: Option<f64>,
    #[serde(default)]
    pub notes: String,
}

/// Create request body.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewWorkout {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 0))]
    pub duration_minutes: i32,
    #[validate(range(min = 0))]
    pub calories_burned: i32,
    #[serde(default)]
    #[validate(nested)]
    pub entries: Vec<NewWorkoutEntry>,
}

/// Partial update. Absent fields are left unchanged; `entries`, when
/// present, replaces the whole collection (an empty list clears it).
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct WorkoutUpdate {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub duration_minutes: Option<i32>,
    #[validate(range(min = 0))]
    pub calories_burned: Option<i32>,
    #[validate(nested)]
    pub entries: Option<Vec<NewWorkoutEntry>>,
}

impl WorkoutUpdate {
    /// True when the request would change nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.duration_minutes.is_none()
            && self.calories_burned.is_none()
            && self.entries.is_none()
    }
}
