//! Email/password verification against stored hashes.

use std::sync::Arc;

use thiserror::Error;

use crate::{PasswordError, PasswordHashing, StoreError, UserRecord, UserStore};

/// Internal verification outcome.
///
/// `NotFound` and `Mismatch` are kept apart here so they can be logged, and
/// collapsed into `AuthError::InvalidCredentials` by the session layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("no account for this email")]
    NotFound,

    #[error("password does not match")]
    Mismatch,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

pub struct CredentialVerifier {
    store: Arc<dyn UserStore>,
    hashing: PasswordHashing,
    // Verified against when the email is unknown, so both failures cost one hash.
    decoy_hash: String,
}

impl CredentialVerifier {
    pub fn new(store: Arc<dyn UserStore>, hashing: PasswordHashing) -> Self {
        let decoy_hash = hashing.decoy_hash();
        Self {
            store,
            hashing,
            decoy_hash,
        }
    }

    pub async fn verify(&self, email: &str, password: &str) -> Result<UserRecord, CredentialError> {
        let Some(user) = self.store.find_by_email(email).await? else {
            let _ = self.hashing.verify_blocking(password, &self.decoy_hash).await;
            return Err(CredentialError::NotFound);
        };

        if self.hashing.verify_blocking(password, &user.password_hash).await? {
            Ok(user)
        } else {
            Err(CredentialError::Mismatch)
        }
    }

    /// Check a password for an already-loaded record.
    pub async fn verify_record(&self, user: &UserRecord, password: &str) -> Result<(), CredentialError> {
        if self.hashing.verify_blocking(password, &user.password_hash).await? {
            Ok(())
        } else {
            Err(CredentialError::Mismatch)
        }
    }
}
