// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer token records.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Persisted token: the hash of the secret, never the secret itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    /// Hex-encoded SHA-256 of the plaintext secret
    pub hash: String,
    pub user_id: i64,
    pub expiry: DateTime<Utc>,
    pub scope: String,
}

/// Result of issuing a token. The plaintext is handed out exactly once.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expiry: DateTime<Utc>,
    pub scope: String,
    #[serde(skip)]
    pub record: TokenRecord,
}
