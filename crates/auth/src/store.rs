//! Credential store boundary.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::{UserId, UserRecord};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("email is already registered")]
    DuplicateEmail,

    /// The record changed since it was read (optimistic concurrency).
    #[error("stale version for user {0}")]
    VersionConflict(UserId),

    #[error("user {0} not found")]
    NotFound(UserId),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Persistence for user records.
///
/// Implementations must:
/// - enforce email uniqueness atomically on `insert` and `update`, so that of two
///   racing inserts with the same email exactly one succeeds;
/// - apply `update` only if the stored `version` equals the record's `version`,
///   bumping it by one on success (compare-and-swap).
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Case-sensitive lookup.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError>;

    /// Lookup by outstanding reset token (expired tokens included).
    async fn find_by_reset_token(&self, token: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn insert(&self, user: UserRecord) -> Result<UserRecord, StoreError>;

    /// Returns the stored record with its new version.
    async fn update(&self, user: UserRecord) -> Result<UserRecord, StoreError>;

    async fn list(&self) -> Result<Vec<UserRecord>, StoreError>;

    /// Returns `false` if no such user existed.
    async fn delete(&self, id: UserId) -> Result<bool, StoreError>;
}

#[async_trait]
impl<S> UserStore for Arc<S>
where
    S: UserStore + ?Sized,
{
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        (**self).find_by_email(email).await
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        (**self).find_by_id(id).await
    }

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<UserRecord>, StoreError> {
        (**self).find_by_reset_token(token).await
    }

    async fn insert(&self, user: UserRecord) -> Result<UserRecord, StoreError> {
        (**self).insert(user).await
    }

    async fn update(&self, user: UserRecord) -> Result<UserRecord, StoreError> {
        (**self).update(user).await
    }

    async fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
        (**self).list().await
    }

    async fn delete(&self, id: UserId) -> Result<bool, StoreError> {
        (**self).delete(id).await
    }
}
