use std::net::IpAddr;
use tracing::warn;
use woothee::parser::Parser;

use crate::errors::AppError;

/// OS/browser pair shown in new-device alerts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub os: String,
    pub browser: String,
}

impl DeviceInfo {
    pub fn from_user_agent(user_agent: &str) -> Self {
        match Parser::new().parse(user_agent) {
            Some(result) => Self {
                os: result.os.to_string(),
                browser: format!("{} {}", result.name, result.version),
            },
            None => Self {
                os: "unknown".to_string(),
                browser: "unknown".to_string(),
            },
        }
    }
}

/// Best-effort IP geolocation against an optional MaxMind City database.
pub struct GeoDb {
    reader: maxminddb::Reader<Vec<u8>>,
}

impl GeoDb {
    pub fn open(path: &str) -> Result<Self, AppError> {
        let reader = maxminddb::Reader::open_readfile(path)
            .map_err(|e| AppError::Internal(format!("geoip database: {e}")))?;
        Ok(Self { reader })
    }

    pub fn approx_location(&self, ip: &str) -> Option<String> {
        let addr: IpAddr = ip.parse().ok()?;
        let city: maxminddb::geoip2::City = match self.reader.lookup(addr) {
            Ok(city) => city,
            Err(err) => {
                warn!(%ip, error = %err, "geoip lookup failed");
                return None;
            }
        };

        let city_name = city
            .city
            .and_then(|c| c.names)
            .and_then(|n| n.get("en").map(|s| s.to_string()));
        let country_name = city
            .country
            .and_then(|c| c.names)
            .and_then(|n| n.get("en").map(|s| s.to_string()));

        match (city_name, country_name) {
            (Some(city), Some(country)) => Some(format!("{city}, {country}")),
            (Some(city), None) => Some(city),
            (None, Some(country)) => Some(country),
            (None, None) => None,
        }
    }
}
