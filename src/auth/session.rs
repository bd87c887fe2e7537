use std::sync::Arc;
use tracing::info;

use crate::{
    auth::jwt::{sha256_hex, Identity, TokenCodec, TokenKind},
    errors::AppError,
    store::refresh::RefreshTokenStore,
};

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Orchestrates issuance, rotation and revocation of access/refresh token
/// pairs. Per device-session the lifecycle is: no session -> active
/// (`issue_pair`) -> superseded active (`rotate`) -> revoked (`revoke`);
/// tokens past their embedded expiry behave as revoked without a transition.
#[derive(Clone)]
pub struct SessionService {
    codec: Arc<TokenCodec>,
    store: Arc<dyn RefreshTokenStore>,
}

impl SessionService {
    pub fn new(codec: Arc<TokenCodec>, store: Arc<dyn RefreshTokenStore>) -> Self {
        Self { codec, store }
    }

    /// Signs a fresh pair and persists the refresh token's fingerprint,
    /// rotating out any prior refresh token for this device.
    pub async fn issue_pair(&self, identity: &Identity) -> Result<TokenPair, AppError> {
        let access_token = self.codec.sign(identity, TokenKind::Access)?;
        let refresh_token = self.codec.sign(identity, TokenKind::Refresh)?;

        self.store
            .save(
                identity,
                &sha256_hex(&refresh_token),
                self.codec.refresh_ttl_seconds as u64,
            )
            .await?;

        info!(subject_id = %identity.subject_id, device_id = %identity.device_id,
            "issued token pair");

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Exchanges a presented refresh token for a new pair. The token must
    /// verify, its identity must match the caller-supplied device, and the
    /// store's current record must equal the presented token byte-for-byte
    /// (rejects replayed, rotated-out tokens before their embedded expiry).
    /// Every mismatch yields the same `RefreshToken` error so the response
    /// never leaks which check failed.
    pub async fn rotate(
        &self,
        presented_refresh_token: &str,
        device_id: &str,
    ) -> Result<TokenPair, AppError> {
        let identity = self
            .codec
            .verify(presented_refresh_token, TokenKind::Refresh)?;

        if identity.device_id != device_id {
            return Err(AppError::RefreshToken);
        }

        match self.store.get(&identity).await? {
            Some(stored) if stored == sha256_hex(presented_refresh_token) => {}
            _ => return Err(AppError::RefreshToken),
        }

        self.issue_pair(&identity).await
    }

    /// Empty tokens are the normal anonymous case, `Ok(None)`, not an error.
    /// A present but malformed/expired token, or one missing either identity
    /// half, fails with `AccessToken`.
    pub fn validate_access(&self, access_token: &str) -> Result<Option<Identity>, AppError> {
        if access_token.is_empty() {
            return Ok(None);
        }

        let identity = self.codec.verify(access_token, TokenKind::Access)?;
        if identity.subject_id.is_empty() || identity.device_id.is_empty() {
            return Err(AppError::AccessToken);
        }
        Ok(Some(identity))
    }

    /// Idempotent; used by logout.
    pub async fn revoke(&self, identity: &Identity) -> Result<(), AppError> {
        self.store.delete(identity).await?;
        info!(subject_id = %identity.subject_id, device_id = %identity.device_id,
            "revoked refresh token");
        Ok(())
    }
}
