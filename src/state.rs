use std::sync::Arc;

use mongodb::{
    options::{ClientOptions, IndexOptions},
    Client, Collection, IndexModel,
};

use crate::{
    auth::{jwt::TokenCodec, session::SessionService},
    config::Config,
    errors::AppError,
    models::account::Account,
    notify::{device::GeoDb, Notifier, TracingNotifier},
    store::{
        account::{AccountStore, MongoAccountStore},
        refresh::RedisRefreshTokenStore,
        reset::{RedisResetTokenStore, ResetTokenStore},
    },
};

/// Lifecycle-managed collaborators, constructed once at process start and
/// injected everywhere; no ambient globals.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub accounts: Arc<dyn AccountStore>,
    pub sessions: SessionService,
    pub reset_tokens: Arc<dyn ResetTokenStore>,
    pub notifier: Arc<dyn Notifier>,
    pub geo: Option<Arc<GeoDb>>,
}

impl AppState {
    pub async fn new(cfg: Config) -> Result<Self, AppError> {
        let mut opts = ClientOptions::parse(&cfg.mongodb_uri).await?;
        opts.app_name = Some("gatekeeper".to_string());
        let client = Client::with_options(opts)?;
        let db = client.database(&cfg.db_name);

        let accounts: Collection<Account> = db.collection("accounts");
        let email_index = IndexModel::builder()
            .keys(mongodb::bson::doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        let _ = accounts.create_index(email_index).await?;

        let redis_client = redis::Client::open(cfg.redis_url.as_str())?;
        let redis_conn = redis_client.get_connection_manager().await?;

        let codec = Arc::new(TokenCodec::new(&cfg));
        let sessions = SessionService::new(
            codec,
            Arc::new(RedisRefreshTokenStore::new(redis_conn.clone())),
        );

        let geo = match &cfg.geoip_db_path {
            Some(path) => Some(Arc::new(GeoDb::open(path)?)),
            None => None,
        };

        Ok(Self {
            cfg: Arc::new(cfg),
            accounts: Arc::new(MongoAccountStore::new(accounts)),
            sessions,
            reset_tokens: Arc::new(RedisResetTokenStore::new(redis_conn)),
            notifier: Arc::new(TracingNotifier),
            geo,
        })
    }

    #[cfg(test)]
    pub fn for_tests(notifier: Arc<dyn Notifier>) -> Self {
        use crate::store::memory::{
            MemoryAccountStore, MemoryRefreshTokenStore, MemoryResetTokenStore,
        };

        let cfg = Config::for_tests();
        let codec = Arc::new(TokenCodec::new(&cfg));
        Self {
            cfg: Arc::new(cfg),
            accounts: Arc::new(MemoryAccountStore::default()),
            sessions: SessionService::new(codec, Arc::new(MemoryRefreshTokenStore::default())),
            reset_tokens: Arc::new(MemoryResetTokenStore::default()),
            notifier,
            geo: None,
        }
    }
}
