use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use storefront_auth::{NewUser, Role, TokenCodec, select_token};

use crate::app::routes::{ADMIN_ONLY, ANY_ROLE, gated};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;
use crate::cookie::{self, SESSION_COOKIE};

pub fn router(codec: &Arc<TokenCodec>) -> Router {
    Router::new()
        .route("/", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password/:token", post(reset_password))
        .route("/check", gated(get(check), codec, ANY_ROLE))
        .route("/admin", gated(get(admin_profile), codec, ADMIN_ONLY))
        .route("/change-password", gated(post(change_password), codec, ANY_ROLE))
}

/// Public signup always creates a `User`; elevated roles are granted through `PUT /user/:id`.
pub async fn signup(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::SignupRequest>,
) -> axum::response::Response {
    let new_user = NewUser {
        name: body.name,
        email: body.email,
        password: body.password,
        role: Role::User,
    };

    match services.sessions.signup(new_user, Utc::now()).await {
        Ok(user) => (StatusCode::CREATED, Json(dto::UserView::from(&user))).into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LoginRequest>,
) -> axum::response::Response {
    let session = match services.sessions.login(&body.email, &body.password, Utc::now()).await {
        Ok(s) => s,
        Err(e) => return errors::auth_error_to_response(e),
    };

    let set_cookie = cookie::session_cookie(
        &session.token,
        services.sessions.config().session_ttl,
        services.cookie_secure,
    );

    (
        [(header::SET_COOKIE, set_cookie)],
        Json(dto::LoginResponse {
            user: dto::SessionUser::from(&session.claims),
            expires_at: session.claims.exp,
            token: session.token,
        }),
    )
        .into_response()
}

/// Clears the cookie. The token itself stays valid until it expires.
pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
) -> axum::response::Response {
    let presented = select_token(
        cookie::cookie_value(&headers, SESSION_COOKIE),
        cookie::bearer_token(&headers),
    );
    let claims = presented.and_then(|token| services.codec.verify(token, Utc::now()).ok());
    services.sessions.logout(claims.as_ref());

    (
        [(header::SET_COOKIE, cookie::clear_session_cookie(services.cookie_secure))],
        Json(dto::MessageResponse::new("logged out")),
    )
        .into_response()
}

pub async fn check(Extension(principal): Extension<PrincipalContext>) -> impl IntoResponse {
    Json(dto::CheckResponse {
        logged_in: true,
        user: dto::SessionUser::from(principal.claims()),
    })
}

pub async fn admin_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    match services.get_user(principal.user_id()).await {
        Ok(user) => Json(dto::UserView::from(&user)).into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}

/// Same response whether or not the email is registered.
pub async fn forgot_password(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ForgotPasswordRequest>,
) -> axum::response::Response {
    match services.sessions.forgot_password(&body.email, Utc::now()).await {
        Ok(()) => Json(dto::MessageResponse::new(
            "if the account exists, a reset link has been sent",
        ))
        .into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}

pub async fn reset_password(
    Extension(services): Extension<Arc<AppServices>>,
    Path(token): Path<String>,
    Json(body): Json<dto::ResetPasswordRequest>,
) -> axum::response::Response {
    match services
        .sessions
        .reset_password(&token, &body.password, Utc::now())
        .await
    {
        Ok(()) => Json(dto::MessageResponse::new("password has been reset")).into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}

pub async fn change_password(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::ChangePasswordRequest>,
) -> axum::response::Response {
    match services
        .sessions
        .change_password(principal.user_id(), &body.old_password, &body.new_password)
        .await
    {
        Ok(()) => Json(dto::MessageResponse::new("password changed")).into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}
