// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use crate::db::StorageError;
use crate::services::credentials::CredentialError;
use crate::services::tokens::TokenError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid authentication credentials")]
    InvalidCredentials,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (error, details) = match &self {
            AppError::Unauthorized => ("unauthorized", None),
            AppError::InvalidCredentials => ("invalid_credentials", None),
            AppError::Forbidden(msg) => ("forbidden", Some(msg.clone())),
            AppError::NotFound(msg) => ("not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => ("bad_request", Some(msg.clone())),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                ("database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                ("internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (self.status(), Json(body)).into_response()
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => AppError::NotFound("Resource does not exist".to_string()),
            StorageError::Conflict(msg) => {
                tracing::warn!(error = %msg, "Constraint violation");
                AppError::BadRequest("Request conflicts with existing data".to_string())
            }
            other => AppError::Database(other.to_string()),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Storage(e) => AppError::Database(e.to_string()),
            TokenError::Generation => {
                AppError::Internal(anyhow::anyhow!("Secure token generation failed"))
            }
            TokenError::ExpiryOutOfRange => {
                AppError::Internal(anyhow::anyhow!("Token expiry out of range"))
            }
            // Never tell the caller which check failed.
            TokenError::NotFound
            | TokenError::Expired
            | TokenError::ScopeMismatch
            | TokenError::Orphaned => AppError::Unauthorized,
        }
    }
}

impl From<CredentialError> for AppError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::InvalidCredentials => AppError::InvalidCredentials,
            CredentialError::UsernameTaken => {
                AppError::BadRequest("username already taken".to_string())
            }
            CredentialError::Invalid(errors) => errors.into(),
            CredentialError::Hashing(msg) => {
                AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", msg))
            }
            CredentialError::Storage(e) => AppError::Database(e.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .errors()
            .keys()
            .map(|field| field.to_string())
            .collect();
        fields.sort();
        AppError::BadRequest(format!("invalid fields: {}", fields.join(", ")))
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
