use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    errors::AppError,
    notify::{NotificationKind, NotificationPayload},
    password::hash_password,
    services::auth_service::dispatch,
    state::AppState,
};

/// Always succeeds from the caller's perspective: unknown emails are logged
/// and dropped so the endpoint cannot be used for account enumeration.
pub async fn request_password_reset(state: &AppState, email: &str) -> Result<(), AppError> {
    let email = email.trim().to_lowercase();
    info!(%email, "password reset requested");

    let Some(account) = state.accounts.find_by_email(&email).await? else {
        info!(%email, "password reset requested for unknown email");
        return Ok(());
    };

    let token = Uuid::new_v4().to_string();
    state
        .reset_tokens
        .save(&token, &account.id.to_hex(), state.cfg.reset_token_ttl_seconds)
        .await?;

    dispatch(
        state,
        NotificationKind::PasswordReset,
        &account,
        NotificationPayload {
            token: Some(token),
            ..Default::default()
        },
    )
    .await;

    Ok(())
}

pub async fn validate_reset_token(state: &AppState, token: &str) -> Result<(), AppError> {
    if token.is_empty() {
        return Err(AppError::ResetToken);
    }
    match state.reset_tokens.get(token).await? {
        Some(_) => Ok(()),
        None => Err(AppError::ResetToken),
    }
}

pub async fn reset_password(
    state: &AppState,
    token: &str,
    new_password: &str,
) -> Result<(), AppError> {
    if token.is_empty() {
        return Err(AppError::ResetToken);
    }

    let Some(account_id) = state.reset_tokens.get(token).await? else {
        warn!("reset attempted with unknown or expired token");
        return Err(AppError::ResetToken);
    };

    let mut account = state
        .accounts
        .find_by_id(&account_id)
        .await?
        .ok_or(AppError::ResetToken)?;

    account.password_hash = hash_password(new_password)?;
    state.accounts.save(&account).await?;
    state.reset_tokens.delete(token).await?;

    info!(id = %account.id, "password reset completed");
    Ok(())
}
