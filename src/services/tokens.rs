// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Opaque bearer token issuance and validation.
//!
//! Tokens are 32 random bytes, handed to the client as URL-safe base64.
//! Only the hex SHA-256 of the token is persisted; a database leak does not
//! yield usable credentials.

use crate::db::{StorageError, TokenStore, UserStore};
use crate::models::{IssuedToken, TokenRecord, User};
use crate::time_utils::Clock;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::DateTime;
use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tokio::task::JoinHandle;

/// Number of random bytes in a token secret.
pub const TOKEN_BYTES: usize = 32;

/// Reasons a presented token was not accepted.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token not recognized")]
    NotFound,

    #[error("Token expired")]
    Expired,

    #[error("Token scope does not match")]
    ScopeMismatch,

    /// The token outlived its user; token and user deletion are not atomic.
    #[error("Token owner no longer exists")]
    Orphaned,

    #[error("Secure random generation failed")]
    Generation,

    #[error("Token lifetime out of range")]
    ExpiryOutOfRange,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Issues, validates and sweeps bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    tokens: Arc<dyn TokenStore>,
    users: Arc<dyn UserStore>,
    clock: Arc<dyn Clock>,
    rng: SystemRandom,
}

impl TokenService {
    pub fn new(
        tokens: Arc<dyn TokenStore>,
        users: Arc<dyn UserStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tokens,
            users,
            clock,
            rng: SystemRandom::new(),
        }
    }

    /// Issue a token for `user_id`. The returned plaintext is not kept anywhere.
    pub async fn issue_token(
        &self,
        user_id: i64,
        ttl: chrono::Duration,
        scope: &str,
    ) -> Result<IssuedToken, TokenError> {
        let mut secret = [0u8; TOKEN_BYTES];
        self.rng
            .fill(&mut secret)
            .map_err(|_| TokenError::Generation)?;

        // Stored with whole-second precision; hand out exactly what is stored.
        let expiry = self
            .clock
            .now()
            .checked_add_signed(ttl)
            .and_then(|expiry| DateTime::from_timestamp(expiry.timestamp(), 0))
            .ok_or(TokenError::ExpiryOutOfRange)?;

        let token = URL_SAFE_NO_PAD.encode(secret);
        let record = TokenRecord {
            hash: hash_token(&token),
            user_id,
            expiry,
            scope: scope.to_string(),
        };

        self.tokens.insert_token(&record).await?;

        tracing::info!(user_id, scope, expiry = %record.expiry, "Issued token");

        Ok(IssuedToken {
            token,
            expiry: record.expiry,
            scope: record.scope.clone(),
            record,
        })
    }

    /// Resolve a presented token to its user, if it is known, unexpired and
    /// issued for `required_scope`.
    pub async fn validate_token(
        &self,
        presented: &str,
        required_scope: &str,
    ) -> Result<User, TokenError> {
        let hash = hash_token(presented);

        let record = self
            .tokens
            .get_token(&hash)
            .await?
            .ok_or(TokenError::NotFound)?;

        if !bool::from(record.hash.as_bytes().ct_eq(hash.as_bytes())) {
            return Err(TokenError::NotFound);
        }

        if self.clock.now() > record.expiry {
            return Err(TokenError::Expired);
        }

        if record.scope != required_scope {
            return Err(TokenError::ScopeMismatch);
        }

        match self.users.get_user_by_id(record.user_id).await? {
            Some(user) => Ok(user),
            None => {
                tracing::warn!(user_id = record.user_id, "Token references a missing user");
                Err(TokenError::Orphaned)
            }
        }
    }

    /// Delete every expired token. Safe to run alongside issue/validate.
    pub async fn revoke_expired(&self) -> Result<u64, TokenError> {
        let removed = self.tokens.delete_expired_tokens(self.clock.now()).await?;
        if removed > 0 {
            tracing::info!(removed, "Swept expired tokens");
        }
        Ok(removed)
    }

    /// Revoke all of a user's tokens with the given scope (logout).
    pub async fn revoke_all_for_user(&self, user_id: i64, scope: &str) -> Result<u64, TokenError> {
        let removed = self.tokens.delete_tokens_for_user(user_id, scope).await?;
        tracing::info!(user_id, scope, removed, "Revoked user tokens");
        Ok(removed)
    }

    /// Run [`TokenService::revoke_expired`] every `interval` until the task is
    /// aborted. Failures are logged and the sweep continues on the next tick.
    pub fn spawn_expiry_sweeper(self, interval: std::time::Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = self.revoke_expired().await {
                    tracing::error!(error = %e, "Expired token sweep failed");
                }
            }
        })
    }
}

/// Hex SHA-256 of a token as presented by the client.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_token_is_deterministic_hex() {
        let hash = hash_token("abc");
        assert_eq!(hash, hash_token("abc"));
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_ne!(hash, hash_token("abd"));
    }
}
