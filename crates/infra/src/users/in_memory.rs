use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use storefront_auth::{StoreError, UserId, UserRecord, UserStore};

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<UserId, UserRecord>,
    by_email: HashMap<String, UserId>,
}

/// In-memory user store for tests/dev.
///
/// Every mutation runs under a single write lock, so the email-uniqueness
/// check and the version compare-and-swap are atomic.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<Inner>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("user store lock poisoned".to_string())
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner
            .by_email
            .get(email)
            .and_then(|id| inner.users.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner.users.get(&id).cloned())
    }

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<UserRecord>, StoreError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner
            .users
            .values()
            .find(|u| u.reset_token.as_deref() == Some(token))
            .cloned())
    }

    async fn insert(&self, user: UserRecord) -> Result<UserRecord, StoreError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        if inner.by_email.contains_key(&user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        inner.by_email.insert(user.email.clone(), user.id);
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, mut user: UserRecord) -> Result<UserRecord, StoreError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;

        let current = inner.users.get(&user.id).ok_or(StoreError::NotFound(user.id))?;
        if current.version != user.version {
            return Err(StoreError::VersionConflict(user.id));
        }

        let old_email = current.email.clone();
        if old_email != user.email {
            if inner.by_email.contains_key(&user.email) {
                return Err(StoreError::DuplicateEmail);
            }
            inner.by_email.remove(&old_email);
            inner.by_email.insert(user.email.clone(), user.id);
        }

        user.version += 1;
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        let mut users: Vec<UserRecord> = inner.users.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn delete(&self, id: UserId) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        match inner.users.remove(&id) {
            Some(user) => {
                inner.by_email.remove(&user.email);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
