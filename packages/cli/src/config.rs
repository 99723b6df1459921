use std::env;
use std::num::ParseIntError;
use thiserror::Error;

use worklane_requests::{HttpNotifierConfig, ThrottleConfig};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid port number: {0}")]
    InvalidPort(#[from] ParseIntError),
    #[error("Port {0} is out of valid range (1-65535)")]
    PortOutOfRange(u16),
}

#[derive(Debug)]
pub struct Config {
    pub port: u16,
    pub cors_origin: String,
    /// Storage URL, e.g. `sqlite:/path/to/worklane.db` or `memory:`.
    /// Falls back to the default on-disk database when unset.
    pub database_url: Option<String>,
    pub throttle: ThrottleConfig,
    /// Outbound notification settings; notifications are log-only when unset.
    pub notifier: Option<HttpNotifierConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port_str = env::var("PORT").unwrap_or_else(|_| "4101".to_string());

        let port = port_str.parse::<u16>()?;

        if port == 0 {
            return Err(ConfigError::PortOutOfRange(port));
        }

        let cors_origin =
            env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:5173".to_string());

        let database_url = env::var("WORKLANE_DB_URL").ok();

        let throttle_enabled = env::var("SUBMISSION_THROTTLE_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .unwrap_or(true);
        let submissions_per_minute = env::var("SUBMISSIONS_PER_MINUTE")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(3);

        let throttle = ThrottleConfig {
            enabled: throttle_enabled,
            submissions_per_minute,
        };

        // All four notifier settings must be present to enable outbound email
        let notifier = match (
            env::var("NOTIFY_ENDPOINT").ok(),
            env::var("NOTIFY_API_KEY").ok(),
            env::var("NOTIFY_FROM_ADDRESS").ok(),
            env::var("NOTIFY_ADMIN_ADDRESS").ok(),
        ) {
            (Some(endpoint), Some(api_key), Some(from_address), Some(admin_address)) => {
                Some(HttpNotifierConfig {
                    endpoint,
                    api_key,
                    from_address,
                    admin_address,
                })
            }
            _ => None,
        };

        Ok(Config {
            port,
            cors_origin,
            database_url,
            throttle,
            notifier,
        })
    }
}
