// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login (token issuance) and logout (token revocation).

use crate::config::AUTHENTICATION_SCOPE;
use crate::error::Result;
use crate::extract::ValidatedJson;
use crate::middleware::CurrentUser;
use crate::models::IssuedToken;
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/tokens/authentication", post(create_token))
}

pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/tokens/authentication", delete(revoke_tokens))
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[derive(Serialize)]
pub struct TokenEnvelope {
    pub auth_token: IssuedToken,
}

/// Exchange username/password for a bearer token.
async fn create_token(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<(StatusCode, Json<TokenEnvelope>)> {
    let user = state
        .credentials
        .verify_credentials(&request.username, &request.password)
        .await?;

    let issued = state
        .tokens
        .issue_token(user.id, state.config.token_ttl, AUTHENTICATION_SCOPE)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(TokenEnvelope { auth_token: issued }),
    ))
}

/// Revoke every authentication token of the caller.
async fn revoke_tokens(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<StatusCode> {
    state
        .tokens
        .revoke_all_for_user(user.id, AUTHENTICATION_SCOPE)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
