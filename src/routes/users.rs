// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User registration.

use crate::error::Result;
use crate::extract::ValidatedJson;
use crate::models::{NewUser, UserResponse};
use crate::AppState;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Serialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/users", post(register_user))
}

#[derive(Serialize)]
pub struct UserEnvelope {
    pub user: UserResponse,
}

async fn register_user(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<NewUser>,
) -> Result<(StatusCode, Json<UserEnvelope>)> {
    let user = state.credentials.register_user(&request).await?;

    Ok((
        StatusCode::CREATED,
        Json(UserEnvelope { user: user.into() }),
    ))
}
