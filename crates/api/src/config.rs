use std::str::FromStr;

use vitrine_core::device_status::{
    DeviceStatusPolicy, DEFAULT_OFFLINE_AFTER_MINS, DEFAULT_STALE_AFTER_MINS,
};
use vitrine_pipeline::DEFAULT_STORE_TIMEOUT;

/// A configuration variable that is set but cannot be parsed.
#[derive(Debug, thiserror::Error)]
#[error("{var} has an invalid value '{value}'")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins, from the comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// Bound on each alert/reading store call.
    pub store_timeout_secs: u64,
    pub device_offline_after_mins: i64,
    pub device_stale_after_mins: i64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                 |
    /// |-----------------------------|-------------------------|
    /// | `HOST`                      | `0.0.0.0`               |
    /// | `PORT`                      | `3000`                  |
    /// | `CORS_ORIGINS`              | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                    |
    /// | `STORE_TIMEOUT_SECS`        | `10`                    |
    /// | `DEVICE_OFFLINE_AFTER_MINS` | `60`                    |
    /// | `DEVICE_STALE_AFTER_MINS`   | `1440`                  |
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host,
            port: env_or("PORT", 3000)?,
            cors_origins,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30)?,
            store_timeout_secs: env_or("STORE_TIMEOUT_SECS", DEFAULT_STORE_TIMEOUT.as_secs())?,
            device_offline_after_mins: env_or(
                "DEVICE_OFFLINE_AFTER_MINS",
                DEFAULT_OFFLINE_AFTER_MINS,
            )?,
            device_stale_after_mins: env_or("DEVICE_STALE_AFTER_MINS", DEFAULT_STALE_AFTER_MINS)?,
        })
    }

    pub fn device_status_policy(&self) -> DeviceStatusPolicy {
        DeviceStatusPolicy::from_minutes(self.device_offline_after_mins, self.device_stale_after_mins)
    }
}

fn env_or<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError { var, value }),
        Err(_) => Ok(default),
    }
}
