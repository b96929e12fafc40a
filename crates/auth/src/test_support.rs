//! Minimal in-crate collaborators for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{NotifyError, PasswordHashing, ResetNotifier, StoreError, UserId, UserRecord, UserStore};

pub fn cheap_hashing() -> PasswordHashing {
    PasswordHashing::with_params(1024, 1, 1).unwrap()
}

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<UserId, UserRecord>>,
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<UserRecord>, StoreError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .values()
            .find(|u| u.reset_token.as_deref() == Some(token))
            .cloned())
    }

    async fn insert(&self, user: UserRecord) -> Result<UserRecord, StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, mut user: UserRecord) -> Result<UserRecord, StoreError> {
        let mut users = self.users.lock().unwrap();
        let current = users.get(&user.id).ok_or(StoreError::NotFound(user.id))?;
        if current.version != user.version {
            return Err(StoreError::VersionConflict(user.id));
        }
        user.version += 1;
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
        Ok(self.users.lock().unwrap().values().cloned().collect())
    }

    async fn delete(&self, id: UserId) -> Result<bool, StoreError> {
        Ok(self.users.lock().unwrap().remove(&id).is_some())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResetNotifier for RecordingNotifier {
    async fn notify(&self, email: &str, reset_token: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((email.to_string(), reset_token.to_string()));
        Ok(())
    }
}
