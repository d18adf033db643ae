// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout CRUD routes. All of them require an authenticated caller.

use crate::error::{AppError, Result};
use crate::extract::{PathParam, ValidatedJson};
use crate::middleware::CurrentUser;
use crate::models::{NewWorkout, Workout, WorkoutUpdate};
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

/// Workout routes (auth middleware is applied in routes/mod.rs).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/workouts", get(list_workouts).post(create_workout))
        .route(
            "/workouts/{id}",
            get(get_workout).put(update_workout).delete(delete_workout),
        )
}

#[derive(Serialize)]
pub struct WorkoutEnvelope {
    pub workout: Workout,
}

#[derive(Serialize)]
pub struct WorkoutsEnvelope {
    pub workouts: Vec<Workout>,
}

async fn list_workouts(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<WorkoutsEnvelope>> {
    let workouts = state.workouts.list_for(&user).await?;
    Ok(Json(WorkoutsEnvelope { workouts }))
}

async fn create_workout(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(request): ValidatedJson<NewWorkout>,
) -> Result<(StatusCode, Json<WorkoutEnvelope>)> {
    let workout = state.workouts.create(&user, &request).await?;
    Ok((StatusCode::CREATED, Json(WorkoutEnvelope { workout })))
}

async fn get_workout(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i64>,
) -> Result<Json<WorkoutEnvelope>> {
    let workout = state.workouts.get(id).await?;
    Ok(Json(WorkoutEnvelope { workout }))
}

async fn update_workout(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    PathParam(id): PathParam<i64>,
    ValidatedJson(changes): ValidatedJson<WorkoutUpdate>,
) -> Result<Json<WorkoutEnvelope>> {
    if changes.is_empty() {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }
    let workout = state.workouts.update(&user, id, &changes).await?;
    Ok(Json(WorkoutEnvelope { workout }))
}

async fn delete_workout(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    PathParam(id): PathParam<i64>,
) -> Result<StatusCode> {
    state.workouts.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
