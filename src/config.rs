//! Admin configuration parsed from environment variables.

use std::time::Duration;

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

pub const DEFAULT_API_KEY_ENV: &str = "BACKEND_API_KEY";
pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const DEFAULT_TOAST_MS: u64 = 3000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var {var}")]
    Missing { var: String },

    #[error("config parse failed: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub url: String,
    pub api_key: String,
    pub access_token: Option<String>,
    pub timeouts: BackendTimeouts,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminConfig {
    pub backend: BackendConfig,
    pub page_size: u64,
    pub toast_duration: Duration,
}

impl AdminConfig {
    /// Build typed admin config from environment variables.
    ///
    /// Required:
    /// - `BACKEND_URL`
    /// - the API key, in the env var named by `BACKEND_API_KEY_ENV`
    ///   (default `BACKEND_API_KEY`)
    ///
    /// Optional:
    /// - `BACKEND_ACCESS_TOKEN`: signed-in user's session token
    /// - `ADMIN_PAGE_SIZE`: default 10, must be at least 1
    /// - `ADMIN_TOAST_MS`: default 3000
    /// - `BACKEND_REQUEST_TIMEOUT_SECS`: default 30
    /// - `BACKEND_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns `Missing` for absent required vars and `Parse` for a zero page size.
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = std::env::var("BACKEND_URL")
            .map_err(|_| ConfigError::Missing { var: "BACKEND_URL".into() })?
            .trim_end_matches('/')
            .to_string();

        let key_var = std::env::var("BACKEND_API_KEY_ENV").unwrap_or_else(|_| DEFAULT_API_KEY_ENV.to_string());
        let api_key = std::env::var(&key_var).map_err(|_| ConfigError::Missing { var: key_var.clone() })?;

        let access_token = std::env::var("BACKEND_ACCESS_TOKEN")
            .ok()
            .filter(|t| !t.is_empty());

        let page_size = env_parse_u64("ADMIN_PAGE_SIZE", DEFAULT_PAGE_SIZE);
        if page_size == 0 {
            return Err(ConfigError::Parse("ADMIN_PAGE_SIZE must be at least 1".into()));
        }

        let timeouts = BackendTimeouts {
            request_secs: env_parse_u64("BACKEND_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("BACKEND_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self {
            backend: BackendConfig { url, api_key, access_token, timeouts },
            page_size,
            toast_duration: Duration::from_millis(env_parse_u64("ADMIN_TOAST_MS", DEFAULT_TOAST_MS)),
        })
    }
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}
