use std::sync::Arc;

use axum::{extract::State, middleware::Next, response::Response};
use chrono::Utc;

use storefront_auth::{RoleSet, TokenCodec};

use crate::app::errors;
use crate::context::PrincipalContext;
use crate::cookie::{self, SESSION_COOKIE};

/// Per-route gate configuration: the shared codec plus the roles the route admits.
#[derive(Clone)]
pub struct GateState {
    pub codec: Arc<TokenCodec>,
    pub allowed: RoleSet,
}

impl GateState {
    pub fn new(codec: Arc<TokenCodec>, allowed: RoleSet) -> Self {
        Self { codec, allowed }
    }
}

pub async fn authorize_request(
    State(gate): State<GateState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let headers = req.headers();
    let decision = storefront_auth::authorize(
        &gate.codec,
        cookie::cookie_value(headers, SESSION_COOKIE),
        cookie::bearer_token(headers),
        &gate.allowed,
        Utc::now(),
    );

    match decision {
        Ok(claims) => {
            req.extensions_mut().insert(PrincipalContext::new(claims));
            next.run(req).await
        }
        Err(e) => {
            tracing::debug!(error = %e, path = %req.uri().path(), "request rejected by gate");
            errors::auth_error_to_response(e)
        }
    }
}
