#[derive(Clone, Debug)]
pub struct Config {
    pub mongodb_uri: String,
    pub db_name: String,
    pub redis_url: String,

    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub access_token_ttl_seconds: i64,
    pub refresh_token_ttl_seconds: i64,
    pub reset_token_ttl_seconds: u64,

    pub geoip_db_path: Option<String>,
    pub production: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let mongodb_uri = std::env::var("MONGODB_URI").expect("MONGODB_URI is required");
        let db_name = std::env::var("DB_NAME").unwrap_or_else(|_| "auth_db".to_string());
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        let access_token_secret =
            std::env::var("JWT_ACCESS_SECRET").expect("JWT_ACCESS_SECRET is required");
        let refresh_token_secret =
            std::env::var("JWT_REFRESH_SECRET").expect("JWT_REFRESH_SECRET is required");
        assert_ne!(
            access_token_secret, refresh_token_secret,
            "access and refresh secrets must differ"
        );

        let access_token_ttl_seconds = std::env::var("ACCESS_TOKEN_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(15 * 60);

        let refresh_token_ttl_seconds = std::env::var("REFRESH_TOKEN_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(7 * 24 * 60 * 60);

        let reset_token_ttl_seconds = std::env::var("RESET_TOKEN_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(24 * 60 * 60);

        let geoip_db_path = std::env::var("GEOIP_DB_PATH").ok();

        let production = std::env::var("APP_ENV")
            .map(|v| v == "production")
            .unwrap_or(false);

        Self {
            mongodb_uri,
            db_name,
            redis_url,
            access_token_secret,
            refresh_token_secret,
            access_token_ttl_seconds,
            refresh_token_ttl_seconds,
            reset_token_ttl_seconds,
            geoip_db_path,
            production,
        }
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            mongodb_uri: String::new(),
            db_name: "auth_test".to_string(),
            redis_url: String::new(),
            access_token_secret: "access-secret-for-tests".to_string(),
            refresh_token_secret: "refresh-secret-for-tests".to_string(),
            access_token_ttl_seconds: 15 * 60,
            refresh_token_ttl_seconds: 7 * 24 * 60 * 60,
            reset_token_ttl_seconds: 24 * 60 * 60,
            geoip_db_path: None,
            production: false,
        }
    }
}
