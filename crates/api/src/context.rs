use storefront_auth::{Role, SessionClaims, UserId};

/// Principal context for a request (verified session claims).
///
/// Inserted by the gate middleware; present on every gated route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    claims: SessionClaims,
}

impl PrincipalContext {
    pub fn new(claims: SessionClaims) -> Self {
        Self { claims }
    }

    pub fn user_id(&self) -> UserId {
        self.claims.sub
    }

    pub fn role(&self) -> Role {
        self.claims.role
    }

    pub fn claims(&self) -> &SessionClaims {
        &self.claims
    }
}
