use std::sync::Arc;

use axum::{Router, routing::MethodRouter};

use storefront_auth::{Role, RoleSet, TokenCodec};

use crate::middleware::{GateState, authorize_request};

pub mod auth;
pub mod system;
pub mod users;

pub const ANY_ROLE: &[Role] = &[Role::Admin, Role::Staff, Role::User];
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// Router for everything under `/auth` and `/user`. Gated routes carry their
/// own role set; the rest are public.
pub fn router(codec: Arc<TokenCodec>) -> Router {
    Router::new()
        .nest("/auth", auth::router(&codec))
        .nest("/user", users::router(&codec))
}

/// Put `method` behind the gate, admitting exactly `roles`.
pub(crate) fn gated<S>(method: MethodRouter<S>, codec: &Arc<TokenCodec>, roles: &[Role]) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    let gate = GateState::new(codec.clone(), RoleSet::of(roles));
    method.route_layer(axum::middleware::from_fn_with_state(gate, authorize_request))
}
