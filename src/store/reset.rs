use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};

use crate::errors::AppError;

pub const RESET_TOKEN_KEY_PREFIX: &str = "reset_password_token:";

fn reset_token_key(token: &str) -> String {
    format!("{RESET_TOKEN_KEY_PREFIX}{token}")
}

/// One-shot password-reset tokens mapping `token -> account id`.
#[async_trait]
pub trait ResetTokenStore: Send + Sync {
    async fn save(&self, token: &str, account_id: &str, ttl_seconds: u64)
        -> Result<(), AppError>;

    async fn get(&self, token: &str) -> Result<Option<String>, AppError>;

    async fn delete(&self, token: &str) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct RedisResetTokenStore {
    conn: ConnectionManager,
}

impl RedisResetTokenStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl ResetTokenStore for RedisResetTokenStore {
    async fn save(
        &self,
        token: &str,
        account_id: &str,
        ttl_seconds: u64,
    ) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(reset_token_key(token), account_id, ttl_seconds)
            .await?;
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.conn.clone();
        Ok(conn
            .get::<_, Option<String>>(reset_token_key(token))
            .await?)
    }

    async fn delete(&self, token: &str) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(reset_token_key(token)).await?;
        Ok(())
    }
}
