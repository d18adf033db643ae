// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password hashing and username/password verification.

use crate::db::{StorageError, UserStore};
use crate::models::{NewUser, User};
use crate::time_utils::Clock;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::{Arc, OnceLock};
use validator::Validate;

/// Errors from credential checks and registration.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// Unknown user or wrong password; deliberately indistinguishable.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Username already taken")]
    UsernameTaken,

    #[error(transparent)]
    Invalid(#[from] validator::ValidationErrors),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Verifies username/password pairs against stored argon2 hashes.
#[derive(Clone)]
pub struct CredentialVerifier {
    users: Arc<dyn UserStore>,
    clock: Arc<dyn Clock>,
}

impl CredentialVerifier {
    pub fn new(users: Arc<dyn UserStore>, clock: Arc<dyn Clock>) -> Self {
        Self { users, clock }
    }

    /// Check a username/password pair.
    ///
    /// An unknown username still pays for a full argon2 verification against
    /// a dummy hash, so response time does not reveal whether the user exists.
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<User, CredentialError> {
        let user = self.users.get_user_by_username(username).await?;

        let stored_hash = user.as_ref().map(|user| user.password_hash.clone());
        let password = password.to_string();
        let matches = tokio::task::spawn_blocking(move || -> Result<bool, CredentialError> {
            let hash = match &stored_hash {
                Some(hash) => hash.as_str(),
                None => dummy_hash()?,
            };
            Ok(verify_password(&password, hash))
        })
        .await
        .map_err(|e| CredentialError::Hashing(e.to_string()))??;

        match user {
            Some(user) if matches => {
                tracing::debug!(user_id = user.id, "Credentials verified");
                Ok(user)
            }
            _ => {
                tracing::info!("Rejected login attempt");
                Err(CredentialError::InvalidCredentials)
            }
        }
    }

    /// Validate a registration request, hash its password and store the user.
    pub async fn register_user(&self, request: &NewUser) -> Result<User, CredentialError> {
        request.validate()?;

        let password = request.password.clone();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| CredentialError::Hashing(e.to_string()))??;

        let user = self
            .users
            .create_user(
                &request.username,
                &request.email,
                &password_hash,
                &request.bio,
                self.clock.now(),
            )
            .await
            .map_err(|e| match e {
                StorageError::Conflict(_) => CredentialError::UsernameTaken,
                other => CredentialError::Storage(other),
            })?;

        tracing::info!(user_id = user.id, "User registered");
        Ok(user)
    }
}

/// Hash a password with a fresh random salt (argon2id, PHC string output).
pub fn hash_password(password: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CredentialError::Hashing(e.to_string()))
}

/// Check `password` against a PHC hash string. Malformed hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Hash used to equalize the cost of lookups for unknown usernames.
fn dummy_hash() -> Result<&'static str, CredentialError> {
    static DUMMY: OnceLock<String> = OnceLock::new();
    if let Some(hash) = DUMMY.get() {
        return Ok(hash.as_str());
    }
    let hash = hash_password("not-a-real-password")?;
    Ok(DUMMY.get_or_init(|| hash).as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteDb;
    use crate::time_utils::ManualClock;

    async fn verifier() -> CredentialVerifier {
        let db = SqliteDb::in_memory().await.unwrap();
        CredentialVerifier::new(Arc::new(db), Arc::new(ManualClock::fixed()))
    }

    fn request(username: &str, email: &str, password: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            bio: String::new(),
        }
    }

    #[tokio::test]
    async fn test_register_then_verify() {
        let verifier = verifier().await;
        let user = verifier
            .register_user(&request("erin", "erin@example.com", "pa55word!"))
            .await
            .unwrap();
        assert_ne!(user.password_hash, "pa55word!");

        let verified = verifier.verify_credentials("erin", "pa55word!").await.unwrap();
        assert_eq!(verified, user);

        assert!(matches!(
            verifier.verify_credentials("erin", "wrong-pass").await,
            Err(CredentialError::InvalidCredentials)
        ));
        assert!(matches!(
            verifier.verify_credentials("nobody", "pa55word!").await,
            Err(CredentialError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_and_duplicate() {
        let verifier = verifier().await;

        assert!(matches!(
            verifier
                .register_user(&request("frank", "not-an-email", "pa55word!"))
                .await,
            Err(CredentialError::Invalid(_))
        ));

        verifier
            .register_user(&request("frank", "frank@example.com", "pa55word!"))
            .await
            .unwrap();
        assert!(matches!(
            verifier
                .register_user(&request("frank", "other@example.com", "pa55word!"))
                .await,
            Err(CredentialError::UsernameTaken)
        ));
    }

    #[test]
    fn test_hash_is_salted_and_not_plaintext() {
        let first = hash_password("correct horse").unwrap();
        let second = hash_password("correct horse").unwrap();

        assert!(!first.contains("correct horse"));
        assert!(first.starts_with("$argon2"));
        assert_ne!(first, second, "each hash gets its own salt");
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("hunter22").unwrap();
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
        assert!(!verify_password("hunter22", "not-a-phc-string"));
    }
}
