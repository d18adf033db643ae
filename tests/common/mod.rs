// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use workout_tracker::config::{Config, AUTHENTICATION_SCOPE};
use workout_tracker::db::{SqliteDb, UserStore};
use workout_tracker::models::{NewWorkout, NewWorkoutEntry, User};
use workout_tracker::routes::create_router;
use workout_tracker::time_utils::{Clock, ManualClock};
use workout_tracker::AppState;

/// Placeholder hash for users that never log in with a password.
#[allow(dead_code)]
pub const STUB_PASSWORD_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c3R1YnNhbHQ$c3R1Yg";

/// Router plus handles into its state for assertions.
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub clock: Arc<ManualClock>,
}

/// Create a test app over a fresh in-memory database and a manual clock.
#[allow(dead_code)]
pub async fn create_test_app() -> TestApp {
    let db = SqliteDb::in_memory()
        .await
        .expect("Failed to open in-memory database");
    let clock = Arc::new(ManualClock::fixed());
    let state = Arc::new(AppState::with_clock(
        Config::test_default(),
        db,
        clock.clone(),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        clock,
    }
}

impl TestApp {
    /// Current time on the app's manual clock.
    #[allow(dead_code)]
    pub fn clock_now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }
}

/// Insert a user directly, skipping password hashing.
#[allow(dead_code)]
pub async fn seed_user(state: &AppState, username: &str) -> User {
    state
        .db
        .create_user(
            username,
            &format!("{}@example.com", username),
            STUB_PASSWORD_HASH,
            "",
            chrono::Utc::now(),
        )
        .await
        .expect("Failed to seed user")
}

/// Insert a user with a fixed id.
#[allow(dead_code)]
pub async fn seed_user_with_id(state: &AppState, id: i64, username: &str) -> User {
    let now = chrono::Utc::now();
    sqlx::query(
        "INSERT INTO users (id, username, email, password_hash, bio, created_at, updated_at) \
         VALUES (?, ?, ?, ?, '', ?, ?)",
    )
    .bind(id)
    .bind(username)
    .bind(format!("{}@example.com", username))
    .bind(STUB_PASSWORD_HASH)
    .bind(now)
    .bind(now)
    .execute(state.db.pool())
    .await
    .expect("Failed to seed user");

    state
        .db
        .get_user_by_id(id)
        .await
        .unwrap()
        .expect("Seeded user missing")
}

/// Issue an authentication token for `user_id` with the configured TTL.
#[allow(dead_code)]
pub async fn auth_token(state: &AppState, user_id: i64) -> String {
    state
        .tokens
        .issue_token(user_id, state.config.token_ttl, AUTHENTICATION_SCOPE)
        .await
        .expect("Failed to issue token")
        .token
}

#[allow(dead_code)]
pub fn entry(name: &str, sets: i32) -> NewWorkoutEntry {
    NewWorkoutEntry {
        exercise_name: name.to_string(),
        sets,
        reps: Some(10),
        weight: Some(20.5),
        notes: format!("{} notes", name),
    }
}

#[allow(dead_code)]
pub fn new_workout(title: &str, entries: Vec<NewWorkoutEntry>) -> NewWorkout {
    NewWorkout {
        title: title.to_string(),
        description: "A solid session".to_string(),
        duration_minutes: 60,
        calories_burned: 450,
        entries,
    }
}

/// Send a request through the router and decode the JSON response body.
/// Returns `Value::Null` for empty bodies.
#[allow(dead_code)]
pub async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}
