//! Process configuration.
//!
//! Read once at startup from `SWAP_*` environment variables. Every value
//! has a default, so an empty environment gives a working local setup.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::api::{ApiConfig, DEFAULT_BASE_URL};
use crate::geo;
use crate::reservation::ReservationConfig;
use crate::store::DEFAULT_STORE_PATH;

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_GATEWAY: &str = "vnpay";
pub const DEFAULT_STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a whole number of seconds, got {value:?}")]
    InvalidSeconds { var: &'static str, value: String },

    #[error("{var} must be a socket address like 127.0.0.1:3000, got {value:?}")]
    InvalidAddr { var: &'static str, value: String },

    #[error("{var} must not be empty")]
    Empty { var: &'static str },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub api_timeout_secs: u64,
    pub listen_addr: SocketAddr,
    pub store_path: PathBuf,
    /// Base URL this front-end is reachable at, used for payment return links.
    pub public_url: String,
    pub payment_gateway: String,
    pub geo_timeout_secs: u64,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// `json` or anything else for plain text.
    pub log_format: String,
    pub static_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        let listen_addr = SocketAddr::from(([127, 0, 0, 1], 3000));
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            api_timeout_secs: 30,
            listen_addr,
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            public_url: format!("http://{listen_addr}"),
            payment_gateway: DEFAULT_GATEWAY.to_string(),
            geo_timeout_secs: geo::DEFAULT_TIMEOUT.as_secs(),
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
        }
    }
}

impl AppConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable
    /// name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string());
        let mut config = Self::default();

        if let Some(url) = get("SWAP_API_BASE_URL") {
            config.api_base_url = non_empty("SWAP_API_BASE_URL", url)?;
        }
        if let Some(value) = get("SWAP_API_TIMEOUT_SECS") {
            config.api_timeout_secs = seconds("SWAP_API_TIMEOUT_SECS", value)?;
        }
        if let Some(value) = get("SWAP_LISTEN_ADDR") {
            config.listen_addr = value.parse().map_err(|_| ConfigError::InvalidAddr {
                var: "SWAP_LISTEN_ADDR",
                value: value.clone(),
            })?;
            // Return links follow the listen address unless set explicitly
            config.public_url = format!("http://{}", config.listen_addr);
        }
        if let Some(path) = get("SWAP_STORE_PATH") {
            config.store_path = PathBuf::from(non_empty("SWAP_STORE_PATH", path)?);
        }
        if let Some(url) = get("SWAP_PUBLIC_URL") {
            config.public_url = non_empty("SWAP_PUBLIC_URL", url)?;
        }
        if let Some(gateway) = get("SWAP_PAYMENT_GATEWAY") {
            config.payment_gateway = non_empty("SWAP_PAYMENT_GATEWAY", gateway)?.to_lowercase();
        }
        if let Some(value) = get("SWAP_GEO_TIMEOUT_SECS") {
            config.geo_timeout_secs = seconds("SWAP_GEO_TIMEOUT_SECS", value)?;
        }
        if let Some(level) = get("SWAP_LOG").filter(|l| !l.is_empty()) {
            config.log_level = level;
        }
        if let Some(format) = get("SWAP_LOG_FORMAT").filter(|f| !f.is_empty()) {
            config.log_format = format.to_lowercase();
        }
        if let Some(dir) = get("SWAP_STATIC_DIR") {
            config.static_dir = PathBuf::from(non_empty("SWAP_STATIC_DIR", dir)?);
        }

        Ok(config)
    }

    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = path.into();
        self
    }

    pub fn with_payment_gateway(mut self, gateway: impl Into<String>) -> Self {
        self.payment_gateway = gateway.into();
        self
    }

    pub fn with_geo_timeout(mut self, secs: u64) -> Self {
        self.geo_timeout_secs = secs;
        self
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig::new(&self.api_base_url).with_timeout(self.api_timeout_secs)
    }

    pub fn reservation_config(&self) -> ReservationConfig {
        ReservationConfig::new(&self.public_url)
    }

    pub fn geo_timeout(&self) -> Duration {
        Duration::from_secs(self.geo_timeout_secs)
    }
}

fn non_empty(var: &'static str, value: String) -> Result<String, ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Empty { var });
    }
    Ok(value)
}

fn seconds(var: &'static str, value: String) -> Result<u64, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidSeconds { var, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8080");
        assert_eq!(config.api_timeout_secs, 30);
        assert_eq!(config.listen_addr.to_string(), DEFAULT_LISTEN_ADDR);
        assert_eq!(config.public_url, "http://127.0.0.1:3000");
        assert_eq!(config.payment_gateway, "vnpay");
        assert_eq!(config.geo_timeout(), Duration::from_secs(10));
        assert_eq!(config.store_path, PathBuf::from(DEFAULT_STORE_PATH));
    }

    #[test]
    fn values_are_read() {
        let config = AppConfig::from_lookup(lookup(&[
            ("SWAP_API_BASE_URL", "https://api.example/"),
            ("SWAP_API_TIMEOUT_SECS", " 5 "),
            ("SWAP_LISTEN_ADDR", "0.0.0.0:8000"),
            ("SWAP_PAYMENT_GATEWAY", "MOMO"),
            ("SWAP_LOG_FORMAT", "JSON"),
        ]))
        .unwrap();

        assert_eq!(config.api_config().base_url, "https://api.example");
        assert_eq!(config.api_timeout_secs, 5);
        assert_eq!(config.public_url, "http://0.0.0.0:8000");
        assert_eq!(config.payment_gateway, "momo");
        assert_eq!(config.log_format, "json");
    }

    #[test]
    fn explicit_public_url_wins() {
        let config = AppConfig::from_lookup(lookup(&[
            ("SWAP_LISTEN_ADDR", "0.0.0.0:8000"),
            ("SWAP_PUBLIC_URL", "https://swap.example"),
        ]))
        .unwrap();
        assert_eq!(
            config.reservation_config().return_url(crate::domain::BookingId(3)),
            "https://swap.example/booking/status?bookingId=3"
        );
    }

    #[test]
    fn invalid_values_are_errors() {
        let err = AppConfig::from_lookup(lookup(&[("SWAP_API_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidSeconds { var: "SWAP_API_TIMEOUT_SECS", .. }
        ));

        let err = AppConfig::from_lookup(lookup(&[("SWAP_LISTEN_ADDR", "localhost")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAddr { .. }));

        let err = AppConfig::from_lookup(lookup(&[("SWAP_PAYMENT_GATEWAY", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Empty { .. }));
    }

    #[test]
    fn builders() {
        let config = AppConfig::default()
            .with_store_path("/tmp/s.json")
            .with_geo_timeout(2)
            .with_payment_gateway("zalopay");
        assert_eq!(config.store_path, PathBuf::from("/tmp/s.json"));
        assert_eq!(config.geo_timeout(), Duration::from_secs(2));
        assert_eq!(config.payment_gateway, "zalopay");
    }
}
