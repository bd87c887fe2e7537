use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::{
    dto::auth::{MessageResponse, RequestPasswordResetRequest, ResetPasswordRequest},
    errors::AppError,
    services::account_service,
    state::AppState,
};

pub async fn request_password_reset(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RequestPasswordResetRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    account_service::request_password_reset(&state, &req.email).await?;
    Ok(Json(MessageResponse::ok()))
}

pub async fn validate_reset_token(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    account_service::validate_reset_token(&state, &token).await?;
    Ok(Json(MessageResponse::ok()))
}

pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    account_service::reset_password(&state, &req.token, &req.password).await?;
    Ok(Json(MessageResponse::ok()))
}
