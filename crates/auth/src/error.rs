//! Failure taxonomy at the session / admission boundary.

use thiserror::Error;

use storefront_core::DomainError;

use crate::{PasswordError, Role, StoreError, TokenError};

pub type AuthResult<T> = Result<T, AuthError>;

/// Why a caller has no usable identity.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UnauthenticatedReason {
    /// Neither a cookie nor a bearer token was presented.
    Missing,
    /// Signature was valid but the token is past its expiry; log in again.
    Expired,
    /// Bad signature, wrong algorithm or unparseable token.
    Invalid,
}

impl core::fmt::Display for UnauthenticatedReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            UnauthenticatedReason::Missing => "no token provided",
            UnauthenticatedReason::Expired => "token expired",
            UnauthenticatedReason::Invalid => "invalid token",
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("unauthenticated: {0}")]
    Unauthenticated(UnauthenticatedReason),

    /// Valid identity, role not admitted by the operation.
    #[error("forbidden: role '{0}' is not permitted")]
    Forbidden(Role),

    /// Unknown email and wrong password are deliberately indistinguishable here.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("reset token is invalid or expired")]
    InvalidOrExpired,

    #[error("current password does not match")]
    Mismatch,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found")]
    NotFound,

    #[error("store error: {0}")]
    Store(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<TokenError> for AuthError {
    fn from(value: TokenError) -> Self {
        match value {
            TokenError::Expired => AuthError::Unauthenticated(UnauthenticatedReason::Expired),
            TokenError::Malformed => AuthError::Unauthenticated(UnauthenticatedReason::Invalid),
            TokenError::Signing(msg) => AuthError::Internal(msg),
        }
    }
}

impl From<DomainError> for AuthError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => AuthError::Validation(msg),
            DomainError::InvalidId(msg) => AuthError::Validation(msg),
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(value: PasswordError) -> Self {
        match value {
            PasswordError::Weak(msg) => AuthError::Validation(msg),
            PasswordError::Hashing(msg) | PasswordError::CorruptHash(msg) => AuthError::Internal(msg),
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::DuplicateEmail => AuthError::Conflict("email is already registered".to_string()),
            StoreError::VersionConflict(_) => {
                AuthError::Conflict("user was modified concurrently".to_string())
            }
            StoreError::NotFound(_) => AuthError::NotFound,
            StoreError::Backend(msg) => AuthError::Store(msg),
        }
    }
}
