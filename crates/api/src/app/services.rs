//! Service wiring: store, notifier, codec and session manager, plus the
//! user-administration operations behind the `/user` routes.

use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use storefront_auth::user::{normalize_email, validate_email, validate_name};
use storefront_auth::{
    AuthError, AuthResult, PasswordHashing, ResetNotifier, Role, SessionConfig, SessionManager,
    TokenCodec, UserId, UserRecord, UserStore,
};
use storefront_infra::{InMemoryUserStore, PostgresUserStore, TracingNotifier};

use crate::config::AppConfig;

/// Changes an administrator may apply to an account. `None` leaves the field as is.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

pub struct AppServices {
    pub sessions: SessionManager,
    pub store: Arc<dyn UserStore>,
    pub codec: Arc<TokenCodec>,
    pub cookie_secure: bool,
}

impl AppServices {
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn UserStore>,
        notifier: Arc<dyn ResetNotifier>,
    ) -> anyhow::Result<Self> {
        let hashing = PasswordHashing::with_params(
            config.argon2.m_cost,
            config.argon2.t_cost,
            config.argon2.p_cost,
        )
        .context("invalid argon2 parameters")?;
        let codec = Arc::new(TokenCodec::new(config.jwt_secret.as_bytes()));

        let sessions = SessionManager::new(
            store.clone(),
            notifier,
            codec.clone(),
            hashing,
            SessionConfig {
                session_ttl: config.session_ttl,
                reset_token_ttl: config.reset_token_ttl,
            },
        );

        Ok(Self {
            sessions,
            store,
            codec,
            cookie_secure: config.cookie_secure,
        })
    }

    pub async fn list_users(&self) -> AuthResult<Vec<UserRecord>> {
        Ok(self.store.list().await?)
    }

    pub async fn list_staff(&self) -> AuthResult<Vec<UserRecord>> {
        let users = self.store.list().await?;
        Ok(users.into_iter().filter(|u| u.role == Role::Staff).collect())
    }

    pub async fn get_user(&self, id: UserId) -> AuthResult<UserRecord> {
        self.store.find_by_id(id).await?.ok_or(AuthError::NotFound)
    }

    #[tracing::instrument(skip(self, update), fields(user_id = %id), err)]
    pub async fn update_user(&self, id: UserId, update: UserUpdate) -> AuthResult<UserRecord> {
        let mut user = self.get_user(id).await?;

        if let Some(name) = update.name {
            validate_name(&name)?;
            user.name = name.trim().to_string();
        }
        if let Some(email) = update.email {
            validate_email(&email)?;
            user.email = normalize_email(&email).to_string();
        }
        if let Some(role) = update.role {
            user.role = role;
        }

        let stored = self.store.update(user).await?;
        tracing::info!(role = %stored.role, "user updated");
        Ok(stored)
    }

    #[tracing::instrument(skip(self), err)]
    pub async fn delete_user(&self, id: UserId) -> AuthResult<()> {
        if self.store.delete(id).await? {
            tracing::info!(user_id = %id, "user deleted");
            Ok(())
        } else {
            Err(AuthError::NotFound)
        }
    }
}

/// Build services from configuration: Postgres when `DATABASE_URL` is set,
/// in-memory otherwise.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let store: Arc<dyn UserStore> = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .context("failed to connect to postgres")?;
            let store = PostgresUserStore::new(pool);
            store.ensure_schema().await.context("failed to prepare users table")?;
            tracing::info!("using postgres user store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; users are kept in memory");
            Arc::new(InMemoryUserStore::new())
        }
    };

    AppServices::new(config, store, Arc::new(TracingNotifier))
}
