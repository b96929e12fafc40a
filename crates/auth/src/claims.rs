use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{Role, TokenError, UserId};

/// The identity a session token speaks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub email: String,
    pub role: Role,
}

/// Session token claims.
///
/// Timestamps are unix seconds so the payload stays a standard JWT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject / user identifier.
    pub sub: UserId,

    pub email: String,

    pub role: Role,

    /// Issued-at timestamp.
    pub iat: i64,

    /// Expiration timestamp.
    pub exp: i64,
}

impl SessionClaims {
    /// Build claims for `identity` valid from `now` until `now + ttl`.
    ///
    /// Resolution is whole seconds: `iat` is `now` truncated to the second and
    /// `exp = iat + ttl.num_seconds()`, so a token issued at `t` stops verifying
    /// at `floor(t) + ttl`, never later than `t + ttl`.
    pub fn new(identity: &Identity, now: DateTime<Utc>, ttl: Duration) -> Self {
        let iat = now.timestamp();
        Self {
            sub: identity.id,
            email: identity.email.clone(),
            role: identity.role,
            iat,
            exp: iat + ttl.num_seconds(),
        }
    }

    pub fn identity(&self) -> Identity {
        Identity {
            id: self.sub,
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Deterministically validate the time window of already-verified claims.
///
/// Note: this validates the *claims* only. Signature verification happens in
/// [`crate::TokenCodec::verify`] before this is called, so a signed token with
/// an empty window (`exp <= iat`) is simply already expired.
pub fn validate_claims(claims: &SessionClaims, now: DateTime<Utc>) -> Result<(), TokenError> {
    if now.timestamp() >= claims.exp {
        return Err(TokenError::Expired);
    }
    Ok(())
}
