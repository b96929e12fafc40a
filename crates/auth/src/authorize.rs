//! Request admission: token selection, verification and role check.
//!
//! - No IO
//! - No panics
//! - Pure decision given the presented tokens, the allowed roles and `now`

use chrono::{DateTime, Utc};

use crate::{AuthError, RoleSet, SessionClaims, TokenCodec, UnauthenticatedReason};

/// Pick the token to verify: the cookie wins, the bearer value is the fallback.
/// Blank values count as absent.
pub fn select_token<'a>(cookie_token: Option<&'a str>, bearer_token: Option<&'a str>) -> Option<&'a str> {
    let present = |t: &&str| !t.trim().is_empty();
    cookie_token
        .filter(present)
        .or_else(|| bearer_token.filter(present))
        .map(str::trim)
}

/// Admit or reject a request for an operation that allows `allowed`.
///
/// On success the verified claims are returned for the request context.
pub fn authorize(
    codec: &TokenCodec,
    cookie_token: Option<&str>,
    bearer_token: Option<&str>,
    allowed: &RoleSet,
    now: DateTime<Utc>,
) -> Result<SessionClaims, AuthError> {
    let token = select_token(cookie_token, bearer_token)
        .ok_or(AuthError::Unauthenticated(UnauthenticatedReason::Missing))?;

    let claims = codec.verify(token, now)?;

    if !allowed.contains(claims.role) {
        return Err(AuthError::Forbidden(claims.role));
    }

    Ok(claims)
}
