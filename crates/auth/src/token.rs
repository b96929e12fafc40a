//! Session token codec (HS256 JWT).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use crate::{Identity, SessionClaims, validate_claims};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Signature is valid but the token is past its expiry.
    #[error("token has expired")]
    Expired,

    /// Signature check failed or the token is structurally invalid.
    #[error("token is malformed or its signature is invalid")]
    Malformed,

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Issues and verifies signed, expiring session tokens.
///
/// The signing secret is injected once at construction and shared read-only;
/// the codec holds no other state and is safe to share across requests.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();

        // Expiry is checked against the caller-supplied clock in `validate_claims`.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Sign a token for `identity` valid until `now + ttl`.
    ///
    /// Timestamps have whole-second resolution (see [`SessionClaims::new`]); a
    /// `ttl` under one second yields a token that is already expired.
    pub fn issue(
        &self,
        identity: &Identity,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<(String, SessionClaims), TokenError> {
        let claims = SessionClaims::new(identity, now, ttl);
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        Ok((token, claims))
    }

    /// Verify the signature, then the expiry.
    ///
    /// A token that fails the signature check is always `Malformed`, even if its
    /// (untrusted) payload also claims to be expired.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenError> {
        let data = decode::<SessionClaims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "session token rejected");
            TokenError::Malformed
        })?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

impl core::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}
