use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockReason {
    UnconfirmedEmail,
    NewDeviceLogin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedDevice {
    pub device_id: String,
    pub ip: String,
}

/// Invariant: `active == true` implies `block_reason` and `activation_token`
/// are both `None`. The reverse does not hold while an account awaits email
/// confirmation or a new-device re-confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,

    pub active: bool,
    pub block_reason: Option<BlockReason>,
    pub activation_token: Option<String>,
    pub confirmed_devices: Vec<ConfirmedDevice>,

    pub created_at: BsonDateTime,
    pub last_login_at: Option<BsonDateTime>,
    pub language: String,
}

impl Account {
    pub fn new(email: String, password_hash: String, device_id: String, ip: String) -> Self {
        Self {
            id: ObjectId::new(),
            email,
            password_hash,
            phone: None,
            active: false,
            block_reason: Some(BlockReason::UnconfirmedEmail),
            activation_token: Some(Uuid::new_v4().to_string()),
            confirmed_devices: vec![ConfirmedDevice { device_id, ip }],
            created_at: BsonDateTime::now(),
            last_login_at: None,
            language: "en".to_string(),
        }
    }

    pub fn is_confirmed_device(&self, device_id: &str, ip: &str) -> bool {
        self.confirmed_devices
            .iter()
            .any(|d| d.device_id == device_id && d.ip == ip)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AccountPublic {
    pub id: String,
    pub email: String,
    pub phone: Option<String>,
    pub active: bool,
    pub block_reason: Option<BlockReason>,
    pub created_at: String,
    pub last_login_at: Option<String>,
    pub language: String,
}

impl From<Account> for AccountPublic {
    fn from(a: Account) -> Self {
        Self {
            id: a.id.to_hex(),
            email: a.email,
            phone: a.phone,
            active: a.active,
            block_reason: a.block_reason,
            created_at: bson_to_rfc3339(a.created_at),
            last_login_at: a.last_login_at.map(bson_to_rfc3339),
            language: a.language,
        }
    }
}

fn bson_to_rfc3339(dt: BsonDateTime) -> String {
    let ms = dt.timestamp_millis();
    let secs = ms / 1000;
    let nsec = ((ms % 1000) * 1_000_000) as u32;
    let chrono_dt = chrono::DateTime::<chrono::Utc>::from_timestamp(secs, nsec)
        .unwrap_or_else(|| chrono::DateTime::<chrono::Utc>::from_timestamp(0, 0).unwrap());
    chrono_dt.to_rfc3339()
}
