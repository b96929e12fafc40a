use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use storefront_auth::{AuthError, UnauthenticatedReason};

pub fn auth_error_to_response(err: AuthError) -> axum::response::Response {
    match err {
        AuthError::Unauthenticated(UnauthenticatedReason::Missing) => {
            json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "no token provided")
        }
        AuthError::Unauthenticated(UnauthenticatedReason::Expired) => json_error(
            StatusCode::UNAUTHORIZED,
            "token_expired",
            "session expired, please log in again",
        ),
        AuthError::Unauthenticated(UnauthenticatedReason::Invalid) => {
            json_error(StatusCode::UNAUTHORIZED, "invalid_token", "invalid token")
        }
        AuthError::Forbidden(_) => json_error(StatusCode::FORBIDDEN, "forbidden", "access denied"),
        AuthError::InvalidCredentials => {
            json_error(StatusCode::UNAUTHORIZED, "invalid_credentials", "invalid email or password")
        }
        AuthError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        AuthError::InvalidOrExpired => json_error(
            StatusCode::BAD_REQUEST,
            "invalid_or_expired_token",
            "reset token is invalid or expired",
        ),
        AuthError::Mismatch => json_error(
            StatusCode::BAD_REQUEST,
            "password_mismatch",
            "current password does not match",
        ),
        AuthError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        AuthError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        AuthError::Store(msg) => {
            tracing::error!(error = %msg, "user store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", "storage unavailable")
        }
        AuthError::Internal(msg) => {
            tracing::error!(error = %msg, "internal auth failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn invalid_id() -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid user id")
}
