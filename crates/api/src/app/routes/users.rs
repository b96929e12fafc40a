use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    response::IntoResponse,
    routing::{delete, get, put},
};

use storefront_auth::{AuthError, Role, TokenCodec, UserId};

use crate::app::routes::{ADMIN_ONLY, ANY_ROLE, gated};
use crate::app::services::{AppServices, UserUpdate};
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router(codec: &Arc<TokenCodec>) -> Router {
    Router::new()
        .route("/", gated(get(list_users), codec, ADMIN_ONLY))
        .route("/staff", gated(get(list_staff), codec, ADMIN_ONLY))
        .route(
            "/:id",
            gated(get(get_user), codec, ANY_ROLE)
                .merge(gated(put(update_user), codec, ADMIN_ONLY))
                .merge(gated(delete(delete_user), codec, ADMIN_ONLY)),
        )
}

pub async fn list_users(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.list_users().await {
        Ok(users) => Json(users.iter().map(dto::UserView::from).collect::<Vec<_>>()).into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}

pub async fn list_staff(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.list_staff().await {
        Ok(users) => Json(users.iter().map(dto::UserView::from).collect::<Vec<_>>()).into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}

/// Admins may read any profile; everyone else only their own.
pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: UserId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::invalid_id(),
    };

    if principal.role() != Role::Admin && principal.user_id() != id {
        return errors::auth_error_to_response(AuthError::Forbidden(principal.role()));
    }

    match services.get_user(id).await {
        Ok(user) => Json(dto::UserView::from(&user)).into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateUserRequest>,
) -> axum::response::Response {
    let id: UserId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::invalid_id(),
    };

    let update = UserUpdate {
        name: body.name,
        email: body.email,
        role: body.role,
    };

    match services.update_user(id, update).await {
        Ok(user) => Json(dto::UserView::from(&user)).into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: UserId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::invalid_id(),
    };

    match services.delete_user(id).await {
        Ok(()) => Json(dto::MessageResponse::new("user deleted")).into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}
