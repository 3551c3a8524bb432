use serde::Deserialize;
use std::env;

use crate::error::{Result, UmiError};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:1224";

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_env_opt<T: std::str::FromStr>(var: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Ignoring.", val, var, e);
                None
            }
        },
        Err(_) => None,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub client: ClientConfig,
    pub polling: PollingConfig,
}

/// Connection settings shared by every client.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Service root, e.g. `http://127.0.0.1:1224`. Endpoint paths are
    /// appended to it unless a call supplies its own `url`.
    pub base_url: String,
    /// Per-request timeout. `None` leaves requests unbounded.
    pub timeout_secs: Option<u64>,
}

/// Cadence used by callers that drive a document job to completion.
///
/// The library itself never sleeps; this only feeds the CLI loop.
#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    pub interval_ms: u64,
    pub max_attempts: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: env::var("UMI_OCR_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            timeout_secs: parse_env_opt("UMI_OCR_TIMEOUT"),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: parse_env_or("UMI_OCR_POLL_INTERVAL_MS", 1000),
            max_attempts: parse_env_or("UMI_OCR_MAX_POLLS", 600),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            polling: PollingConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

impl ClientConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: None,
        }
    }

    /// Parses `base_url`, rejecting anything that is not http(s).
    pub fn parsed_base_url(&self) -> Result<url::Url> {
        let url = url::Url::parse(self.base_url.trim_end_matches('/'))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(UmiError::Config(format!(
                "Unsupported scheme '{other}' in base URL {}",
                self.base_url
            ))),
        }
    }
}
