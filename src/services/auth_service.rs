use mongodb::bson::DateTime as BsonDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{jwt::Identity, session::TokenPair},
    errors::AppError,
    models::account::{Account, AccountPublic, BlockReason},
    notify::{device::DeviceInfo, NotificationKind, NotificationPayload},
    password::{hash_password, verify_password},
    state::AppState,
};

/// Login/registration input, assembled by the HTTP layer (ip and user agent
/// come from the connection, the rest from the request body).
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub device_id: String,
    pub ip: String,
    pub user_agent: String,
    pub language: Option<String>,
}

pub struct AuthOutput {
    pub user: AccountPublic,
    pub tokens: TokenPair,
}

pub async fn register(state: &AppState, creds: Credentials) -> Result<AuthOutput, AppError> {
    let email = creds.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("valid email required".into()));
    }
    if creds.device_id.is_empty() {
        return Err(AppError::Validation("deviceId required".into()));
    }

    info!(%email, ip = %creds.ip, "registering account");

    if state.accounts.find_by_email(&email).await?.is_some() {
        return Err(AppError::AccountAlreadyExists);
    }

    let password_hash = hash_password(&creds.password)?;
    let mut account = Account::new(email, password_hash, creds.device_id.clone(), creds.ip);
    if let Some(language) = creds.language {
        account.language = language;
    }

    state.accounts.insert(&account).await?;

    // Registration must succeed even when the activation email cannot be
    // dispatched.
    dispatch(
        state,
        NotificationKind::AccountActivation,
        &account,
        NotificationPayload {
            token: account.activation_token.clone(),
            ..Default::default()
        },
    )
    .await;

    let identity = Identity::new(account.id.to_hex(), creds.device_id);
    let tokens = state.sessions.issue_pair(&identity).await?;

    info!(email = %account.email, id = %account.id, "account registered");
    Ok(AuthOutput {
        user: account.into(),
        tokens,
    })
}

pub async fn login(state: &AppState, creds: Credentials) -> Result<AuthOutput, AppError> {
    let email = creds.email.trim().to_lowercase();
    if creds.device_id.is_empty() {
        // Without a device id the minted pair could never validate.
        return Err(AppError::Validation("deviceId required".into()));
    }
    info!(%email, device_id = %creds.device_id, ip = %creds.ip, "login attempt");

    let mut account = validate_credentials(state, &email, &creds.password).await?;

    register_device_or_flag(
        state,
        &mut account,
        &creds.device_id,
        &creds.ip,
        &creds.user_agent,
    )
    .await;

    account.last_login_at = Some(BsonDateTime::now());
    state.accounts.save(&account).await?;

    // A flagged login still returns tokens; active=false only gates
    // activation-dependent flows.
    let identity = Identity::new(account.id.to_hex(), creds.device_id);
    let tokens = state.sessions.issue_pair(&identity).await?;

    info!(email = %account.email, "login succeeded");
    Ok(AuthOutput {
        user: account.into(),
        tokens,
    })
}

/// Missing account and wrong password collapse to the same error so the
/// response cannot be used for account enumeration.
async fn validate_credentials(
    state: &AppState,
    email: &str,
    password: &str,
) -> Result<Account, AppError> {
    let Some(account) = state.accounts.find_by_email(email).await? else {
        return Err(AppError::AccountNotFound);
    };

    if !verify_password(password, &account.password_hash)? {
        return Err(AppError::AccountNotFound);
    }

    Ok(account)
}

/// Device-trust check. A login from a `(device_id, ip)` pair the account has
/// never confirmed re-blocks it with a fresh activation token and sends a
/// security alert; a confirmed pair is a no-op.
async fn register_device_or_flag(
    state: &AppState,
    account: &mut Account,
    device_id: &str,
    ip: &str,
    user_agent: &str,
) {
    if account.is_confirmed_device(device_id, ip) {
        return;
    }

    warn!(email = %account.email, %device_id, %ip, "login from unknown device");

    account.active = false;
    account.block_reason = Some(BlockReason::NewDeviceLogin);
    account.activation_token = Some(Uuid::new_v4().to_string());

    let payload = NotificationPayload {
        token: account.activation_token.clone(),
        ip: Some(ip.to_string()),
        device: Some(DeviceInfo::from_user_agent(user_agent)),
        location: state
            .geo
            .as_ref()
            .and_then(|geo| geo.approx_location(ip)),
    };
    dispatch(state, NotificationKind::NewDeviceLogin, account, payload).await;
}

pub async fn activate(state: &AppState, account_id: &str, token: &str) -> Result<(), AppError> {
    if account_id.is_empty() {
        return Err(AppError::Unauthorized);
    }
    if token.is_empty() {
        return Err(AppError::ActivationToken);
    }

    let mut account = state
        .accounts
        .find_by_id(account_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if account.activation_token.as_deref() != Some(token) {
        warn!(id = %account.id, "activation token mismatch");
        return Err(AppError::ActivationToken);
    }

    account.active = true;
    account.activation_token = None;
    account.block_reason = None;
    state.accounts.save(&account).await?;

    info!(id = %account.id, "account activated");
    Ok(())
}

pub async fn logout(state: &AppState, identity: &Identity) -> Result<(), AppError> {
    info!(subject_id = %identity.subject_id, "logout");
    state.sessions.revoke(identity).await
}

pub async fn me(state: &AppState, identity: &Identity) -> Result<AccountPublic, AppError> {
    let account = state
        .accounts
        .find_by_id(&identity.subject_id)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(account.into())
}

pub(crate) async fn dispatch(
    state: &AppState,
    kind: NotificationKind,
    account: &Account,
    payload: NotificationPayload,
) {
    if let Err(err) = state.notifier.notify(kind, account, payload).await {
        warn!(?kind, email = %account.email, error = %err, "notification dispatch failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::testing::RecordingNotifier;
    use std::sync::Arc;

    fn creds(email: &str, device_id: &str, ip: &str) -> Credentials {
        Credentials {
            email: email.to_string(),
            password: "Password1!".to_string(),
            device_id: device_id.to_string(),
            ip: ip.to_string(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101 Firefox/121.0".to_string(),
            language: None,
        }
    }

    fn state_with_notifier() -> (AppState, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        (AppState::for_tests(notifier.clone()), notifier)
    }

    #[tokio::test]
    async fn register_creates_blocked_account_with_tokens() {
        let (state, notifier) = state_with_notifier();

        let out = register(&state, creds("a@b.com", "d1", "1.1.1.1"))
            .await
            .unwrap();

        assert!(!out.user.active);
        assert_eq!(out.user.block_reason, Some(BlockReason::UnconfirmedEmail));
        assert!(!out.tokens.access_token.is_empty());
        assert!(!out.tokens.refresh_token.is_empty());
        assert_eq!(
            notifier.sent.lock().unwrap().as_slice(),
            &[NotificationKind::AccountActivation]
        );

        let stored = state.accounts.find_by_email("a@b.com").await.unwrap().unwrap();
        assert!(stored.activation_token.is_some());
        assert!(stored.is_confirmed_device("d1", "1.1.1.1"));
    }

    #[tokio::test]
    async fn register_then_rotate_then_replay_rejected() {
        let (state, _) = state_with_notifier();

        let out = register(&state, creds("a@b.com", "d1", "1.1.1.1"))
            .await
            .unwrap();

        let rotated = state
            .sessions
            .rotate(&out.tokens.refresh_token, "d1")
            .await
            .unwrap();
        assert_ne!(rotated.refresh_token, out.tokens.refresh_token);

        assert!(matches!(
            state.sessions.rotate(&out.tokens.refresh_token, "d1").await,
            Err(AppError::RefreshToken)
        ));
    }

    #[tokio::test]
    async fn duplicate_email_rejected() {
        let (state, _) = state_with_notifier();
        register(&state, creds("a@b.com", "d1", "1.1.1.1"))
            .await
            .unwrap();

        assert!(matches!(
            register(&state, creds("a@b.com", "d2", "2.2.2.2")).await,
            Err(AppError::AccountAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn registration_survives_notification_failure() {
        let notifier = Arc::new(RecordingNotifier {
            fail: true,
            ..Default::default()
        });
        let state = AppState::for_tests(notifier);

        assert!(register(&state, creds("a@b.com", "d1", "1.1.1.1"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn login_unknown_email_and_wrong_password_are_indistinguishable() {
        let (state, _) = state_with_notifier();
        register(&state, creds("a@b.com", "d1", "1.1.1.1"))
            .await
            .unwrap();

        assert!(matches!(
            login(&state, creds("missing@b.com", "d1", "1.1.1.1")).await,
            Err(AppError::AccountNotFound)
        ));

        let mut wrong = creds("a@b.com", "d1", "1.1.1.1");
        wrong.password = "WrongPassword1!".to_string();
        assert!(matches!(
            login(&state, wrong).await,
            Err(AppError::AccountNotFound)
        ));
    }

    #[tokio::test]
    async fn login_requires_device_id() {
        let (state, _) = state_with_notifier();
        register(&state, creds("a@b.com", "d1", "1.1.1.1"))
            .await
            .unwrap();

        assert!(matches!(
            login(&state, creds("a@b.com", "", "1.1.1.1")).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn login_from_confirmed_device_sends_no_alert() {
        let (state, notifier) = state_with_notifier();
        register(&state, creds("a@b.com", "d1", "1.1.1.1"))
            .await
            .unwrap();
        // The account stays blocked on UNCONFIRMED_EMAIL; activate first so
        // the test can observe "active unchanged".
        let id = state
            .accounts
            .find_by_email("a@b.com")
            .await
            .unwrap()
            .unwrap();
        activate(&state, &id.id.to_hex(), id.activation_token.as_deref().unwrap())
            .await
            .unwrap();
        notifier.sent.lock().unwrap().clear();

        let out = login(&state, creds("a@b.com", "d1", "1.1.1.1"))
            .await
            .unwrap();

        assert!(out.user.active);
        assert!(notifier.sent.lock().unwrap().is_empty());
        assert!(out.user.last_login_at.is_some());
    }

    #[tokio::test]
    async fn login_from_unknown_device_flags_account_and_alerts_once() {
        let (state, notifier) = state_with_notifier();
        register(&state, creds("a@b.com", "d1", "1.1.1.1"))
            .await
            .unwrap();
        notifier.sent.lock().unwrap().clear();

        let out = login(&state, creds("a@b.com", "d2", "2.2.2.2"))
            .await
            .unwrap();

        assert!(!out.user.active);
        assert_eq!(out.user.block_reason, Some(BlockReason::NewDeviceLogin));
        assert_eq!(
            notifier.sent.lock().unwrap().as_slice(),
            &[NotificationKind::NewDeviceLogin]
        );
        // Tokens are still issued: the block is a soft flag.
        assert!(!out.tokens.access_token.is_empty());

        let stored = state.accounts.find_by_email("a@b.com").await.unwrap().unwrap();
        assert!(stored.activation_token.is_some());
    }

    #[tokio::test]
    async fn flagged_account_access_token_still_validates() {
        // Decision on the block-on-new-device open question: active=false
        // does not gate general authentication.
        let (state, _) = state_with_notifier();
        register(&state, creds("a@b.com", "d1", "1.1.1.1"))
            .await
            .unwrap();

        let out = login(&state, creds("a@b.com", "d2", "2.2.2.2"))
            .await
            .unwrap();
        assert!(!out.user.active);

        let identity = state
            .sessions
            .validate_access(&out.tokens.access_token)
            .unwrap()
            .unwrap();
        assert_eq!(identity.device_id, "d2");
    }

    #[tokio::test]
    async fn activation_lifecycle() {
        let (state, _) = state_with_notifier();
        register(&state, creds("a@b.com", "d1", "1.1.1.1"))
            .await
            .unwrap();
        let account = state
            .accounts
            .find_by_email("a@b.com")
            .await
            .unwrap()
            .unwrap();
        let id = account.id.to_hex();
        let token = account.activation_token.unwrap();

        assert!(matches!(
            activate(&state, &id, "").await,
            Err(AppError::ActivationToken)
        ));
        assert!(matches!(
            activate(&state, &id, "WRONG").await,
            Err(AppError::ActivationToken)
        ));
        assert!(matches!(
            activate(&state, "", &token).await,
            Err(AppError::Unauthorized)
        ));

        activate(&state, &id, &token).await.unwrap();

        let activated = state.accounts.find_by_id(&id).await.unwrap().unwrap();
        assert!(activated.active);
        assert!(activated.activation_token.is_none());
        assert!(activated.block_reason.is_none());
    }

    #[tokio::test]
    async fn logout_revokes_refresh_token() {
        let (state, _) = state_with_notifier();
        let out = register(&state, creds("a@b.com", "d1", "1.1.1.1"))
            .await
            .unwrap();

        let identity = Identity::new(out.user.id.clone(), "d1");
        logout(&state, &identity).await.unwrap();
        // Idempotent.
        logout(&state, &identity).await.unwrap();

        assert!(state
            .sessions
            .rotate(&out.tokens.refresh_token, "d1")
            .await
            .is_err());
    }
}
