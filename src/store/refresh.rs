use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use tracing::warn;

use crate::{auth::jwt::Identity, errors::AppError};

pub const REFRESH_TOKEN_KEY_PREFIX: &str = "refresh_token:";

pub fn refresh_token_key(identity: &Identity) -> String {
    format!(
        "{}{}:{}",
        REFRESH_TOKEN_KEY_PREFIX, identity.subject_id, identity.device_id
    )
}

/// Server-side shadow record for refresh tokens, keyed by
/// `(subject_id, device_id)`. At most one live record per device: `save`
/// rotates out any prior one. The stored value is the SHA-256 fingerprint of
/// the token, never the token itself.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Deletes any existing record for the identity, then stores the new
    /// fingerprint with the given TTL. A failure of the preliminary delete is
    /// logged and must not block the save; a failed save propagates, since an
    /// unrecorded refresh token would be unrevocable.
    async fn save(
        &self,
        identity: &Identity,
        fingerprint: &str,
        ttl_seconds: u64,
    ) -> Result<(), AppError>;

    async fn get(&self, identity: &Identity) -> Result<Option<String>, AppError>;

    /// Idempotent; absent records are not an error.
    async fn delete(&self, identity: &Identity) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct RedisRefreshTokenStore {
    conn: ConnectionManager,
}

impl RedisRefreshTokenStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl RefreshTokenStore for RedisRefreshTokenStore {
    async fn save(
        &self,
        identity: &Identity,
        fingerprint: &str,
        ttl_seconds: u64,
    ) -> Result<(), AppError> {
        let key = refresh_token_key(identity);
        let mut conn = self.conn.clone();

        // No lock or CAS around delete-then-set: two concurrent rotations for
        // one identity are last-write-wins and the loser's freshly issued
        // refresh token is immediately stale. Accepted risk; see DESIGN.md.
        if let Err(err) = conn.del::<_, ()>(&key).await {
            warn!(%key, error = %err, "failed to delete prior refresh token record");
        }

        conn.set_ex::<_, _, ()>(&key, fingerprint, ttl_seconds)
            .await?;
        Ok(())
    }

    async fn get(&self, identity: &Identity) -> Result<Option<String>, AppError> {
        let key = refresh_token_key(identity);
        let mut conn = self.conn.clone();
        Ok(conn.get::<_, Option<String>>(&key).await?)
    }

    async fn delete(&self, identity: &Identity) -> Result<(), AppError> {
        let key = refresh_token_key(identity);
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(&key).await?;
        Ok(())
    }
}
