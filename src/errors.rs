use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::OnceLock;
use thiserror::Error;

static PRODUCTION: OnceLock<bool> = OnceLock::new();

/// Threads `Config::production` into the response mapping; set once at
/// startup. Unset (tests) behaves as non-production.
pub fn set_production(production: bool) {
    let _ = PRODUCTION.set(production);
}

fn production() -> bool {
    *PRODUCTION.get().unwrap_or(&false)
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid access token")]
    AccessToken,

    #[error("invalid refresh token")]
    RefreshToken,

    #[error("invalid activation token")]
    ActivationToken,

    #[error("invalid or expired reset token")]
    ResetToken,

    #[error("invalid credentials")]
    AccountNotFound,

    #[error("account already exists")]
    AccountAlreadyExists,

    #[error("unauthorized")]
    Unauthorized,

    #[error("validation error: {0}")]
    Validation(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<mongodb::error::Error> for AppError {
    fn from(e: mongodb::error::Error) -> Self {
        AppError::Store(e.to_string())
    }
}

impl From<redis::RedisError> for AppError {
    fn from(e: redis::RedisError) -> Self {
        AppError::Store(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // 401 never distinguishes "token absent" from "token invalid";
        // 400 never distinguishes "no such account" from "wrong password".
        let (status, msg) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            AppError::AccessToken | AppError::RefreshToken => {
                (StatusCode::BAD_REQUEST, "invalid token".to_string())
            }
            AppError::ActivationToken | AppError::ResetToken => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            AppError::AccountNotFound => {
                (StatusCode::BAD_REQUEST, "invalid credentials".to_string())
            }
            AppError::AccountAlreadyExists => {
                (StatusCode::BAD_REQUEST, "account already exists".to_string())
            }
            AppError::Validation(s) => (StatusCode::BAD_REQUEST, s.clone()),
            AppError::Store(s) | AppError::Internal(s) => {
                let msg = if production() {
                    "internal error".to_string()
                } else {
                    s.clone()
                };
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(json!({ "error": msg }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_at_the_http_boundary() {
        assert_eq!(
            AppError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        // The indistinguishable 400 family.
        for err in [
            AppError::AccessToken,
            AppError::RefreshToken,
            AppError::ActivationToken,
            AppError::ResetToken,
            AppError::AccountNotFound,
            AppError::AccountAlreadyExists,
            AppError::Validation("bad".into()),
        ] {
            assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
        }
        assert_eq!(
            AppError::Store("down".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Internal("boom".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
