use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("reset notification failed: {0}")]
pub struct NotifyError(pub String);

/// Delivers password-reset tokens to account owners (e.g. by email).
#[async_trait]
pub trait ResetNotifier: Send + Sync {
    async fn notify(&self, email: &str, reset_token: &str) -> Result<(), NotifyError>;
}
