//! Environment configuration.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8084;
pub const DEFAULT_SESSION_PATH: &str = ".storefront-session.json";
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 10;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("invalid value {value:?} for {key}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the marketplace backend. Unset runs against the in-memory demo store.
    pub api_url: Option<String>,
    pub api_timeout: Duration,
    pub port: u16,
    pub nats_url: Option<String>,
    pub session_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> { Self::from_lookup(|key| std::env::var(key).ok()) }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match var("PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError { key: "PORT", value: v })?,
            None => DEFAULT_PORT,
        };
        let timeout = match var("STOREFRONT_API_TIMEOUT_SECS") {
            Some(v) => v.parse().map_err(|_| ConfigError { key: "STOREFRONT_API_TIMEOUT_SECS", value: v })?,
            None => DEFAULT_API_TIMEOUT_SECS,
        };

        Ok(Self {
            api_url: var("STOREFRONT_API_URL"),
            api_timeout: Duration::from_secs(timeout),
            port,
            nats_url: var("NATS_URL"),
            session_path: var("STOREFRONT_SESSION_PATH").unwrap_or_else(|| DEFAULT_SESSION_PATH.into()).into(),
        })
    }
}
