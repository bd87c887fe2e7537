use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{config::Config, errors::AppError};

/// The `(subject, device)` pair bound into every issued token. A subject may
/// hold sessions on several devices at once; each device has its own
/// refresh-token lineage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject_id: String,
    pub device_id: String,
}

impl Identity {
    pub fn new(subject_id: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            device_id: device_id.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    fn as_str(self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }

    fn error(self) -> AppError {
        match self {
            TokenKind::Access => AppError::AccessToken,
            TokenKind::Refresh => AppError::RefreshToken,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub device_id: String,
    pub iat: usize,
    pub exp: usize,
    pub typ: String,
    // Refresh only. Makes every refresh token unique even within one second,
    // so rotation always produces a distinct store fingerprint.
    pub jti: Option<String>,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Signs and verifies the two token classes with distinct secrets. Purely
/// cryptographic/format validation: never fails for business-logic reasons.
pub struct TokenCodec {
    access: Keys,
    refresh: Keys,
    pub access_ttl_seconds: i64,
    pub refresh_ttl_seconds: i64,
}

impl TokenCodec {
    pub fn new(cfg: &Config) -> Self {
        Self {
            access: Keys::from_secret(&cfg.access_token_secret),
            refresh: Keys::from_secret(&cfg.refresh_token_secret),
            access_ttl_seconds: cfg.access_token_ttl_seconds,
            refresh_ttl_seconds: cfg.refresh_token_ttl_seconds,
        }
    }

    fn keys(&self, kind: TokenKind) -> &Keys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    fn ttl_seconds(&self, kind: TokenKind) -> i64 {
        match kind {
            TokenKind::Access => self.access_ttl_seconds,
            TokenKind::Refresh => self.refresh_ttl_seconds,
        }
    }

    pub fn sign(&self, identity: &Identity, kind: TokenKind) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: identity.subject_id.clone(),
            device_id: identity.device_id.clone(),
            iat: now.timestamp() as usize,
            exp: (now + Duration::seconds(self.ttl_seconds(kind))).timestamp() as usize,
            typ: kind.as_str().to_string(),
            jti: match kind {
                TokenKind::Access => None,
                TokenKind::Refresh => Some(Uuid::new_v4().to_string()),
            },
        };
        encode(&Header::default(), &claims, &self.keys(kind).encoding).map_err(|_| kind.error())
    }

    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Identity, AppError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.keys(kind).decoding, &validation)
            .map_err(|_| kind.error())?;

        // Distinct secrets already make cross-class tokens fail signature
        // checks; the typ claim keeps that guarantee even if the secrets are
        // ever misconfigured to the same value.
        if data.claims.typ != kind.as_str() {
            return Err(kind.error());
        }

        Ok(Identity {
            subject_id: data.claims.sub,
            device_id: data.claims.device_id,
        })
    }
}

pub fn sha256_hex(s: &str) -> String {
    let mut h = Sha256::new();
    h.update(s.as_bytes());
    hex::encode(h.finalize())
}
