// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer token authentication pipeline.
//!
//! Two stages:
//! 1. [`resolve_identity`] runs on every request and attaches exactly one
//!    [`Identity`]. Missing, malformed or rejected tokens yield
//!    [`Identity::Anonymous`]; they never fail the request here.
//! 2. [`require_authenticated`] guards protected routes and turns an
//!    anonymous identity into a 401.

use crate::config::AUTHENTICATION_SCOPE;
use crate::error::AppError;
use crate::models::User;
use crate::services::TokenError;
use crate::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Who is making the request.
#[derive(Debug, Clone, PartialEq)]
pub enum Identity {
    Anonymous,
    Authenticated(User),
}

impl Identity {
    pub fn user(&self) -> Option<&User> {
        match self {
            Identity::Anonymous => None,
            Identity::Authenticated(user) => Some(user),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Identity::Anonymous)
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// Returns `None` for a missing header, a different scheme, an empty token,
/// or a value that is not visible ASCII.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() || token.contains(char::is_whitespace) {
        return None;
    }
    Some(token)
}

/// Stage 1: resolve the caller's identity from request headers.
pub async fn identify(state: &AppState, headers: &HeaderMap) -> Identity {
    let Some(token) = bearer_token(headers) else {
        return Identity::Anonymous;
    };

    match state
        .tokens
        .validate_token(token, AUTHENTICATION_SCOPE)
        .await
    {
        Ok(user) => Identity::Authenticated(user),
        Err(TokenError::Storage(e)) => {
            tracing::error!(error = %e, "Token lookup failed; treating caller as anonymous");
            Identity::Anonymous
        }
        Err(e) => {
            tracing::debug!(reason = %e, "Bearer token rejected; treating caller as anonymous");
            Identity::Anonymous
        }
    }
}

/// Middleware for stage 1. Attaches the [`Identity`] to the request.
pub async fn resolve_identity(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = identify(&state, request.headers()).await;
    request.extensions_mut().insert(identity);
    next.run(request).await
}

/// Middleware for stage 2. Rejects anonymous callers with 401.
pub async fn require_authenticated(request: Request, next: Next) -> Result<Response, AppError> {
    match request.extensions().get::<Identity>() {
        Some(identity) if !identity.is_anonymous() => Ok(next.run(request).await),
        _ => Err(AppError::Unauthorized),
    }
}

/// Authenticated caller, extracted from the attached [`Identity`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .and_then(Identity::user)
            .map(|user| CurrentUser(user.clone()))
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&headers_with("Bearer abc123")), Some("abc123"));
        assert_eq!(bearer_token(&headers_with("bearer abc123")), Some("abc123"));
        assert_eq!(bearer_token(&HeaderMap::new()), None);
        assert_eq!(bearer_token(&headers_with("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers_with("Bearer")), None);
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
        assert_eq!(bearer_token(&headers_with("Bearer a b")), None);
    }

    #[test]
    fn test_identity_accessors() {
        assert!(Identity::Anonymous.is_anonymous());
        assert!(Identity::Anonymous.user().is_none());
    }
}
