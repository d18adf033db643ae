// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Mapping from domain errors to HTTP responses.

use axum::{http::StatusCode, response::IntoResponse};
use serde_json::Value;
use validator::Validate;
use workout_tracker::db::StorageError;
use workout_tracker::error::AppError;
use workout_tracker::models::NewUser;
use workout_tracker::services::{CredentialError, TokenError};

async fn body_of(err: AppError) -> (StatusCode, Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[test]
fn test_token_rejections_all_map_to_unauthorized() {
    for err in [
        TokenError::NotFound,
        TokenError::Expired,
        TokenError::ScopeMismatch,
        TokenError::Orphaned,
    ] {
        let app_err: AppError = err.into();
        assert!(matches!(app_err, AppError::Unauthorized));
        assert_eq!(app_err.status(), StatusCode::UNAUTHORIZED);
    }

    let overflow: AppError = TokenError::ExpiryOutOfRange.into();
    assert_eq!(overflow.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let storage: AppError = TokenError::Storage(StorageError::Transient("busy".into())).into();
    assert_eq!(storage.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_storage_error_mapping() {
    let not_found: AppError = StorageError::NotFound.into();
    assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

    let conflict: AppError = StorageError::Conflict("duplicate".into()).into();
    assert_eq!(conflict.status(), StatusCode::BAD_REQUEST);

    let backend: AppError = StorageError::Backend("disk I/O error".into()).into();
    assert_eq!(backend.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_credential_error_mapping() {
    let invalid: AppError = CredentialError::InvalidCredentials.into();
    assert_eq!(invalid.status(), StatusCode::UNAUTHORIZED);

    let taken: AppError = CredentialError::UsernameTaken.into();
    assert_eq!(taken.status(), StatusCode::BAD_REQUEST);

    let hashing: AppError = CredentialError::Hashing("params".into()).into();
    assert_eq!(hashing.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_validation_errors_list_fields() {
    let request = NewUser {
        username: "ab".to_string(),
        email: "nope".to_string(),
        password: "longenough".to_string(),
        bio: String::new(),
    };
    let err: AppError = request.validate().unwrap_err().into();

    match err {
        AppError::BadRequest(msg) => assert_eq!(msg, "invalid fields: email, username"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_database_error_hides_details() {
    let (status, body) = body_of(AppError::Database("no such table: users".into())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "database_error");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_conflict_hides_constraint_text() {
    let err: AppError =
        StorageError::Conflict("UNIQUE constraint failed: users.username".into()).into();
    let (status, body) = body_of(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "Request conflicts with existing data");
    assert!(!body.to_string().contains("UNIQUE"));
}

#[tokio::test]
async fn test_client_errors_carry_details() {
    let (status, body) = body_of(AppError::Forbidden("not your workout".into())).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
    assert_eq!(body["details"], "not your workout");
}
