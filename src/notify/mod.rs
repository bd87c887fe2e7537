pub mod device;

use async_trait::async_trait;
use tracing::info;

use crate::{errors::AppError, models::account::Account, notify::device::DeviceInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    AccountActivation,
    NewDeviceLogin,
    PasswordReset,
}

#[derive(Debug, Clone, Default)]
pub struct NotificationPayload {
    pub token: Option<String>,
    pub ip: Option<String>,
    pub device: Option<DeviceInfo>,
    pub location: Option<String>,
}

/// Multi-channel dispatch (email/SMS/push/desktop) is an external
/// collaborator; the core only hands it a typed payload. Dispatch failures
/// are logged by the caller and must never fail a login or registration.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        kind: NotificationKind,
        account: &Account,
        payload: NotificationPayload,
    ) -> Result<(), AppError>;
}

/// Default dispatcher: structured log records in place of real transports.
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(
        &self,
        kind: NotificationKind,
        account: &Account,
        payload: NotificationPayload,
    ) -> Result<(), AppError> {
        info!(
            kind = ?kind,
            email = %account.email,
            language = %account.language,
            token = payload.token.as_deref().unwrap_or(""),
            ip = payload.ip.as_deref().unwrap_or(""),
            os = payload.device.as_ref().map(|d| d.os.as_str()).unwrap_or(""),
            browser = payload.device.as_ref().map(|d| d.browser.as_str()).unwrap_or(""),
            location = payload.location.as_deref().unwrap_or(""),
            "dispatching notification"
        );
        Ok(())
    }
}
