//! Stored user account record.

use chrono::{DateTime, Utc};
use serde::Serialize;

use storefront_core::DomainError;

use crate::{Identity, Role, UserId};

/// A user account as persisted by a [`crate::UserStore`].
///
/// # Invariants
/// - `reset_token` and `reset_token_expiry` are both set or both unset.
/// - `version` increases by one on every successful store update; updates
///   carrying a stale version are rejected by the store.
///
/// `password_hash` and `reset_token` are skipped on serialization so a record
/// can never leak them through a JSON response or log line.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    #[serde(skip_serializing)]
    pub reset_token: Option<String>,
    #[serde(skip_serializing)]
    pub reset_token_expiry: Option<DateTime<Utc>>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(name: String, email: String, password_hash: String, role: Role, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            name,
            email,
            password_hash,
            role,
            reset_token: None,
            reset_token_expiry: None,
            version: 0,
            created_at: now,
        }
    }

    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            email: self.email.clone(),
            role: self.role,
        }
    }

    pub fn set_reset_token(&mut self, token: String, expiry: DateTime<Utc>) {
        self.reset_token = Some(token);
        self.reset_token_expiry = Some(expiry);
    }

    pub fn clear_reset_token(&mut self) {
        self.reset_token = None;
        self.reset_token_expiry = None;
    }

    /// True if `token` is the outstanding reset token and has not yet expired.
    pub fn reset_token_matches(&self, token: &str, now: DateTime<Utc>) -> bool {
        match (&self.reset_token, self.reset_token_expiry) {
            (Some(stored), Some(expiry)) => stored == token && now < expiry,
            _ => false,
        }
    }
}

impl core::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("reset_pending", &self.reset_token.is_some())
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

/// Canonical form of an email as stored and looked up: surrounding whitespace
/// removed, case preserved.
pub fn normalize_email(email: &str) -> &str {
    email.trim()
}

pub fn validate_email(email: &str) -> Result<(), DomainError> {
    if email.trim().is_empty() || !email.contains('@') {
        return Err(DomainError::validation("invalid email format"));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    Ok(())
}
