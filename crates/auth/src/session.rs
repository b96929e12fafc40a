//! Session lifecycle: signup, login, logout, password reset and change.
//!
//! Sessions are stateless signed tokens. Nothing here can revoke an issued
//! token before its expiry: logout only tells the client to drop it, and
//! password changes leave outstanding tokens valid.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, instrument, warn};

use crate::credentials::{CredentialError, CredentialVerifier};
use crate::password::validate_password;
use crate::user::{normalize_email, validate_email, validate_name};
use crate::{
    AuthError, AuthResult, PasswordHashing, ResetNotifier, Role, SessionClaims, StoreError,
    TokenCodec, UserId, UserRecord, UserStore, generate_reset_token,
};

/// Lifetimes read once from process configuration.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub session_ttl: Duration,
    pub reset_token_ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::hours(24),
            reset_token_ttl: Duration::minutes(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// A freshly signed session token with its decoded claims.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub claims: SessionClaims,
}

pub struct SessionManager {
    store: Arc<dyn UserStore>,
    notifier: Arc<dyn ResetNotifier>,
    codec: Arc<TokenCodec>,
    hashing: PasswordHashing,
    verifier: CredentialVerifier,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn UserStore>,
        notifier: Arc<dyn ResetNotifier>,
        codec: Arc<TokenCodec>,
        hashing: PasswordHashing,
        config: SessionConfig,
    ) -> Self {
        let verifier = CredentialVerifier::new(store.clone(), hashing.clone());
        Self {
            store,
            notifier,
            codec,
            hashing,
            verifier,
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Register an account. No token is issued; the caller must log in.
    #[instrument(skip(self, new_user), fields(email = %new_user.email, role = %new_user.role), err)]
    pub async fn signup(&self, new_user: NewUser, now: DateTime<Utc>) -> AuthResult<UserRecord> {
        validate_name(&new_user.name)?;
        validate_email(&new_user.email)?;
        validate_password(&new_user.password)?;

        let hash = self.hashing.hash_blocking(&new_user.password).await?;
        let record = UserRecord::new(
            new_user.name.trim().to_string(),
            normalize_email(&new_user.email).to_string(),
            hash,
            new_user.role,
            now,
        );

        let stored = self.store.insert(record).await?;
        info!(user_id = %stored.id, "user registered");
        Ok(stored)
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str, now: DateTime<Utc>) -> AuthResult<IssuedSession> {
        let user = match self.verifier.verify(normalize_email(email), password).await {
            Ok(user) => user,
            Err(CredentialError::NotFound) => {
                debug!("login rejected: unknown email");
                return Err(AuthError::InvalidCredentials);
            }
            Err(CredentialError::Mismatch) => {
                debug!("login rejected: wrong password");
                return Err(AuthError::InvalidCredentials);
            }
            Err(CredentialError::Store(e)) => return Err(e.into()),
            Err(CredentialError::Password(e)) => return Err(e.into()),
        };

        let (token, claims) = self.codec.issue(&user.identity(), self.config.session_ttl, now)?;
        info!(user_id = %user.id, role = %user.role, "session issued");
        Ok(IssuedSession { token, claims })
    }

    /// Client-side only: the HTTP layer clears the cookie. The token itself
    /// stays valid until it expires.
    pub fn logout(&self, caller: Option<&SessionClaims>) {
        match caller {
            Some(claims) => info!(user_id = %claims.sub, "logout"),
            None => debug!("logout without a session"),
        }
    }

    /// Always succeeds for well-formed input, whether or not the email exists.
    #[instrument(skip(self), err)]
    pub async fn forgot_password(&self, email: &str, now: DateTime<Utc>) -> AuthResult<()> {
        // Generated on both paths so known and unknown emails do the same work.
        let token = generate_reset_token()?;
        let expiry = now + self.config.reset_token_ttl;

        let Some(mut user) = self.store.find_by_email(normalize_email(email)).await? else {
            debug!("password reset requested for unknown email");
            return Ok(());
        };

        user.set_reset_token(token.clone(), expiry);
        let user = match self.store.update(user).await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "could not store reset token");
                return Ok(());
            }
        };

        if let Err(e) = self.notifier.notify(&user.email, &token).await {
            warn!(user_id = %user.id, error = %e, "reset notification failed");
        } else {
            info!(user_id = %user.id, "password reset token issued");
        }
        Ok(())
    }

    /// Consume a reset token and set a new password.
    ///
    /// Failed attempts leave the token in place so it can be retried before it
    /// expires. Consumption is a version-checked update: of two concurrent
    /// resets with the same token, exactly one succeeds.
    #[instrument(skip_all, err)]
    pub async fn reset_password(&self, token: &str, new_password: &str, now: DateTime<Utc>) -> AuthResult<()> {
        validate_password(new_password)?;

        let Some(mut user) = self.store.find_by_reset_token(token).await? else {
            return Err(AuthError::InvalidOrExpired);
        };
        if !user.reset_token_matches(token, now) {
            debug!(user_id = %user.id, "reset token expired");
            return Err(AuthError::InvalidOrExpired);
        }

        user.password_hash = self.hashing.hash_blocking(new_password).await?;
        user.clear_reset_token();

        match self.store.update(user).await {
            Ok(user) => {
                info!(user_id = %user.id, "password reset");
                Ok(())
            }
            Err(StoreError::VersionConflict(id)) | Err(StoreError::NotFound(id)) => {
                debug!(user_id = %id, "reset token consumed concurrently");
                Err(AuthError::InvalidOrExpired)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Change the password of an authenticated caller.
    ///
    /// The stored hash is untouched unless `old_password` verifies.
    #[instrument(skip(self, old_password, new_password), err)]
    pub async fn change_password(&self, user_id: UserId, old_password: &str, new_password: &str) -> AuthResult<()> {
        validate_password(new_password)?;

        let mut user = self.store.find_by_id(user_id).await?.ok_or(AuthError::NotFound)?;

        match self.verifier.verify_record(&user, old_password).await {
            Ok(()) => {}
            Err(CredentialError::Mismatch) | Err(CredentialError::NotFound) => return Err(AuthError::Mismatch),
            Err(CredentialError::Store(e)) => return Err(e.into()),
            Err(CredentialError::Password(e)) => return Err(e.into()),
        }

        user.password_hash = self.hashing.hash_blocking(new_password).await?;
        self.store.update(user).await?;
        info!(user_id = %user_id, "password changed");
        Ok(())
    }
}
