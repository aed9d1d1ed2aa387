//! Client configuration resolved from the process environment.
//!
//! # Responsibility
//! - Resolve API endpoint, storage location, timeouts and log settings.
//! - Fall back to defaults for unset or blank variables.
//!
//! # Invariants
//! - `api_base_url` never ends with `/`.
//! - `request_timeout` is within 1..=300 seconds.

use crate::logging::{default_log_level, parse_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_API_BASE_URL: &str = "ONBOARD_API_BASE_URL";
pub const ENV_DB_PATH: &str = "ONBOARD_DB_PATH";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "ONBOARD_REQUEST_TIMEOUT_SECS";
pub const ENV_LOG_LEVEL: &str = "ONBOARD_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "ONBOARD_LOG_DIR";

const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
const DEFAULT_DB_FILE_NAME: &str = "onboard_session.sqlite3";
const DEFAULT_LOG_DIR_NAME: &str = "onboard-logs";
const DEFAULT_TIMEOUT_SECS: u64 = 15;
const MAX_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidBaseUrl(String),
    InvalidTimeout(String),
    InvalidLogLevel(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBaseUrl(value) => {
                write!(f, "{ENV_API_BASE_URL} must start with http:// or https://, got `{value}`")
            }
            Self::InvalidTimeout(value) => write!(
                f,
                "{ENV_REQUEST_TIMEOUT_SECS} must be an integer in 1..={MAX_TIMEOUT_SECS}, got `{value}`"
            ),
            Self::InvalidLogLevel(message) => write!(f, "{message}"),
        }
    }
}

impl Error for ConfigError {}

/// Resolved client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub db_path: PathBuf,
    pub request_timeout: Duration,
    pub log_level: &'static str,
    pub log_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            log_level: default_log_level(),
            log_dir: std::env::temp_dir().join(DEFAULT_LOG_DIR_NAME),
        }
    }
}

impl ClientConfig {
    /// Resolves settings from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves settings through an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(url) = read(ENV_API_BASE_URL) {
            config.api_base_url = normalize_base_url(&url)?;
        }
        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(raw) = read(ENV_REQUEST_TIMEOUT_SECS) {
            let secs = raw
                .parse::<u64>()
                .ok()
                .filter(|secs| (1..=MAX_TIMEOUT_SECS).contains(secs))
                .ok_or_else(|| ConfigError::InvalidTimeout(raw.clone()))?;
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = parse_level(&level).map_err(ConfigError::InvalidLogLevel)?;
        }
        if let Some(dir) = read(ENV_LOG_DIR) {
            config.log_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    /// Replaces the API endpoint, validated like `ONBOARD_API_BASE_URL`.
    /// A blank value keeps the current endpoint.
    pub fn with_api_base_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        let raw = raw.trim();
        if !raw.is_empty() {
            self.api_base_url = normalize_base_url(raw)?;
        }
        Ok(self)
    }

    /// Replaces the storage path. A blank value keeps the current path.
    pub fn with_db_path(mut self, path: &str) -> Self {
        let path = path.trim();
        if !path.is_empty() {
            self.db_path = PathBuf::from(path);
        }
        self
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    if !(raw.starts_with("http://") || raw.starts_with("https://")) {
        return Err(ConfigError::InvalidBaseUrl(raw.to_string()));
    }
    let trimmed = raw.trim_end_matches('/');
    if trimmed.ends_with(':') || trimmed.ends_with("//") {
        return Err(ConfigError::InvalidBaseUrl(raw.to_string()));
    }
    Ok(trimmed.to_string())
}
