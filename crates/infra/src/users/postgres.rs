//! Postgres-backed user store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation on `users_email_key`) | `23505` | `DuplicateEmail` |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed / Other | N/A | `Backend` |
//!
//! Updates are compare-and-swap on `version`: the `UPDATE` only matches the row
//! when the stored version equals the caller's, so two racing writers cannot
//! both succeed.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::instrument;

use storefront_auth::{Role, StoreError, UserId, UserRecord, UserStore};

const EMAIL_CONSTRAINT: &str = "users_email_key";

const USER_COLUMNS: &str = "id, name, email, password_hash, role, reset_token, reset_token_expiry, version, created_at";

#[derive(Debug, Clone)]
pub struct PostgresUserStore {
    pool: Arc<PgPool>,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create the `users` table if it does not exist.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id UUID PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                reset_token TEXT NULL UNIQUE,
                reset_token_expiry TIMESTAMPTZ NULL,
                version BIGINT NOT NULL DEFAULT 0,
                created_at TIMESTAMPTZ NOT NULL,
                CONSTRAINT users_email_key UNIQUE (email)
            )
            "#,
        )
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }

    async fn fetch_one_where(
        &self,
        operation: &str,
        predicate: &str,
        bind: impl for<'q> sqlx::Encode<'q, sqlx::Postgres> + sqlx::Type<sqlx::Postgres> + Send + 'static,
    ) -> Result<Option<UserRecord>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {predicate} = $1");
        let row = sqlx::query(&sql)
            .bind(bind)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;

        row.as_ref().map(user_from_row).transpose()
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    #[instrument(skip(self), err)]
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        self.fetch_one_where("find_by_email", "email", email.to_string()).await
    }

    #[instrument(skip(self), err)]
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        self.fetch_one_where("find_by_id", "id", *id.as_uuid()).await
    }

    #[instrument(skip_all, err)]
    async fn find_by_reset_token(&self, token: &str) -> Result<Option<UserRecord>, StoreError> {
        self.fetch_one_where("find_by_reset_token", "reset_token", token.to_string())
            .await
    }

    #[instrument(skip_all, fields(user_id = %user.id), err)]
    async fn insert(&self, user: UserRecord) -> Result<UserRecord, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, name, email, password_hash, role,
                reset_token, reset_token_expiry, version, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.reset_token)
        .bind(user.reset_token_expiry)
        .bind(version_to_db(user.version)?)
        .bind(user.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;

        Ok(user)
    }

    #[instrument(skip_all, fields(user_id = %user.id, version = user.version), err)]
    async fn update(&self, user: UserRecord) -> Result<UserRecord, StoreError> {
        let sql = format!(
            r#"
            UPDATE users
            SET name = $3,
                email = $4,
                password_hash = $5,
                role = $6,
                reset_token = $7,
                reset_token_expiry = $8,
                version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(user.id.as_uuid())
            .bind(version_to_db(user.version)?)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(&user.reset_token)
            .bind(user.reset_token_expiry)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_user", e))?;

        match row {
            Some(row) => user_from_row(&row),
            None => {
                // Either the row is gone or another writer bumped the version.
                let exists = sqlx::query("SELECT 1 FROM users WHERE id = $1")
                    .bind(user.id.as_uuid())
                    .fetch_optional(&*self.pool)
                    .await
                    .map_err(|e| map_sqlx_error("update_user_probe", e))?
                    .is_some();
                if exists {
                    Err(StoreError::VersionConflict(user.id))
                } else {
                    Err(StoreError::NotFound(user.id))
                }
            }
        }
    }

    #[instrument(skip(self), err)]
    async fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC");
        let rows = sqlx::query(&sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_users", e))?;

        rows.iter().map(user_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, id: UserId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;

        Ok(result.rows_affected() > 0)
    }
}

fn user_from_row(row: &sqlx::postgres::PgRow) -> Result<UserRecord, StoreError> {
    let decode = |e: sqlx::Error| StoreError::Backend(format!("failed to decode user row: {e}"));

    let id: uuid::Uuid = row.try_get("id").map_err(decode)?;
    let role: String = row.try_get("role").map_err(decode)?;
    let version: i64 = row.try_get("version").map_err(decode)?;
    let reset_token_expiry: Option<DateTime<Utc>> = row.try_get("reset_token_expiry").map_err(decode)?;

    Ok(UserRecord {
        id: UserId::from_uuid(id),
        name: row.try_get("name").map_err(decode)?,
        email: row.try_get("email").map_err(decode)?,
        password_hash: row.try_get("password_hash").map_err(decode)?,
        role: role
            .parse::<Role>()
            .map_err(|e| StoreError::Backend(format!("invalid stored role: {e}")))?,
        reset_token: row.try_get("reset_token").map_err(decode)?,
        reset_token_expiry,
        version: u64::try_from(version)
            .map_err(|_| StoreError::Backend(format!("negative stored version {version}")))?,
        created_at: row.try_get("created_at").map_err(decode)?,
    })
}

fn version_to_db(version: u64) -> Result<i64, StoreError> {
    i64::try_from(version).map_err(|_| StoreError::Backend(format!("version {version} out of range")))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let is_unique = db_err.code().is_some_and(|code| code.as_ref() == "23505");
            if is_unique && db_err.constraint() == Some(EMAIL_CONSTRAINT) {
                return StoreError::DuplicateEmail;
            }
            StoreError::Backend(format!("database error in {}: {}", operation, db_err.message()))
        }
        sqlx::Error::PoolClosed => StoreError::Backend(format!("connection pool closed in {}", operation)),
        other => StoreError::Backend(format!("database error in {}: {}", operation, other)),
    }
}
