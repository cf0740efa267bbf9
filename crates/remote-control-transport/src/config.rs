//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Credentials;

pub const ENV_URL: &str = "REMOTE_CONTROL_URL";
pub const ENV_USER: &str = "REMOTE_CONTROL_USER";
pub const ENV_PASSWORD: &str = "REMOTE_CONTROL_PASSWORD";
pub const ENV_MIN_TLS: &str = "REMOTE_CONTROL_MIN_TLS";
pub const ENV_TIMEOUT_SECS: &str = "REMOTE_CONTROL_TIMEOUT_SECS";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration value: {0}")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("HTTP client build failed: {0}")]
    HttpClient(String),
}

/// Minimum TLS protocol version the client will negotiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TlsVersion {
    #[serde(rename = "1.2")]
    Tls1_2,
    #[serde(rename = "1.3")]
    Tls1_3,
}

impl TlsVersion {
    fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "1.2" | "tls1.2" | "TLS1.2" => Some(Self::Tls1_2),
            "1.3" | "tls1.3" | "TLS1.3" => Some(Self::Tls1_3),
            _ => None,
        }
    }

    pub(crate) const fn to_reqwest(self) -> reqwest::tls::Version {
        match self {
            Self::Tls1_2 => reqwest::tls::Version::TLS_1_2,
            Self::Tls1_3 => reqwest::tls::Version::TLS_1_3,
        }
    }
}

/// Connection settings for one vendor server.
///
/// TLS policy lives here rather than in any process-wide setting so that
/// clients with different policies can coexist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server root, e.g. `https://control.example.com`.
    pub base_url: String,
    pub credentials: Credentials,
    #[serde(default)]
    pub min_tls_version: Option<TlsVersion>,
    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()
}

impl ClientConfig {
    /// Create a config with default timeout and no TLS floor.
    #[must_use]
    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            base_url: base_url.into(),
            credentials,
            min_tls_version: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: default_user_agent(),
        }
    }

    /// Require at least this TLS version.
    #[must_use]
    pub const fn with_min_tls(mut self, version: TlsVersion) -> Self {
        self.min_tls_version = Some(version);
        self
    }

    /// Load from `REMOTE_CONTROL_*` environment variables.
    ///
    /// # Errors
    /// Returns error if a required variable is missing or a value is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup.
    ///
    /// # Errors
    /// Returns error if a required key is missing or a value is malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let base_url = required(ENV_URL)?;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                key: ENV_URL,
                value: base_url,
            });
        }

        let credentials = Credentials::new(required(ENV_USER)?, required(ENV_PASSWORD)?);
        let mut config = Self::new(base_url, credentials);

        if let Some(raw) = lookup(ENV_MIN_TLS) {
            let version = TlsVersion::parse(&raw).ok_or(ConfigError::Invalid {
                key: ENV_MIN_TLS,
                value: raw,
            })?;
            config = config.with_min_tls(version);
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            config.request_timeout_secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::Invalid {
                    key: ENV_TIMEOUT_SECS,
                    value: raw,
                })?;
        }

        Ok(config)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Full URL of a page-service method.
    #[must_use]
    pub fn endpoint(&self, method: &str) -> String {
        self.service_endpoint("PageService.ashx", method)
    }

    /// Full URL of a method on any `Services/` handler.
    #[must_use]
    pub fn service_endpoint(&self, service: &str, method: &str) -> String {
        format!(
            "{}/Services/{service}/{method}",
            self.base_url.trim_end_matches('/')
        )
    }
}
