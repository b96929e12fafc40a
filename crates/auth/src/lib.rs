//! `storefront-auth` — sessions, credentials and role-based admission.
//!
//! This crate is intentionally decoupled from HTTP. Storage and outbound
//! notifications are reached only through the [`UserStore`] and
//! [`ResetNotifier`] traits.

pub mod authorize;
pub mod claims;
pub mod credentials;
pub mod error;
pub mod notifier;
pub mod password;
pub mod roles;
pub mod session;
pub mod store;
pub mod token;
pub mod user;

#[cfg(test)]
mod test_support;

pub use authorize::{authorize, select_token};
pub use claims::{Identity, SessionClaims, validate_claims};
pub use credentials::{CredentialError, CredentialVerifier};
pub use error::{AuthError, AuthResult, UnauthenticatedReason};
pub use notifier::{NotifyError, ResetNotifier};
pub use password::{PasswordError, PasswordHashing, generate_reset_token};
pub use roles::{Role, RoleSet};
pub use session::{IssuedSession, NewUser, SessionConfig, SessionManager};
pub use store::{StoreError, UserStore};
pub use token::{TokenCodec, TokenError};
pub use user::UserRecord;

pub use storefront_core::UserId;
