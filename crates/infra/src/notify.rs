//! `ResetNotifier` adapters.
//!
//! Neither adapter sends real mail. `TracingNotifier` is the production
//! default until an email transport is wired; `OutboxNotifier` keeps the
//! messages in memory so tests and local tooling can read the token back.

use std::sync::Mutex;

use async_trait::async_trait;
use tracing::info;

use storefront_auth::{NotifyError, ResetNotifier};

/// Logs that a reset was requested. The token itself is never logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait]
impl ResetNotifier for TracingNotifier {
    async fn notify(&self, email: &str, _reset_token: &str) -> Result<(), NotifyError> {
        info!(email, "password reset notification queued");
        Ok(())
    }
}

/// A delivered reset message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetMessage {
    pub email: String,
    pub reset_token: String,
}

/// Collects reset messages in memory.
#[derive(Debug, Default)]
pub struct OutboxNotifier {
    messages: Mutex<Vec<ResetMessage>>,
}

impl OutboxNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything sent so far.
    pub fn sent(&self) -> Vec<ResetMessage> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Most recent token sent to `email`, if any.
    pub fn latest_for(&self, email: &str) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .find(|m| m.email == email)
            .map(|m| m.reset_token)
    }

    /// Drain the outbox.
    pub fn take(&self) -> Vec<ResetMessage> {
        self.messages
            .lock()
            .map(|mut m| std::mem::take(&mut *m))
            .unwrap_or_default()
    }
}

#[async_trait]
impl ResetNotifier for OutboxNotifier {
    async fn notify(&self, email: &str, reset_token: &str) -> Result<(), NotifyError> {
        let mut messages = self
            .messages
            .lock()
            .map_err(|_| NotifyError("outbox lock poisoned".to_string()))?;
        messages.push(ResetMessage {
            email: email.to_string(),
            reset_token: reset_token.to_string(),
        });
        Ok(())
    }
}
