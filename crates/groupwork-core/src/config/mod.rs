//! Client configuration.
//!
//! Provides the `ClientConfig` struct shared by the CLI and any other
//! front end to locate the backend and tune polling.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{normalize_base_url, normalize_text_option};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

pub const ENV_API_URL: &str = "GROUPWORK_API_URL";
pub const ENV_POLL_INTERVAL: &str = "GROUPWORK_POLL_INTERVAL_SECS";
pub const ENV_REQUEST_TIMEOUT: &str = "GROUPWORK_REQUEST_TIMEOUT_SECS";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub api_base_url: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

const fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `GROUPWORK_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a key lookup, then validate.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(url) = normalize_text_option(lookup(ENV_API_URL)) {
            self.api_base_url = url;
        }
        if let Some(raw) = normalize_text_option(lookup(ENV_POLL_INTERVAL)) {
            self.poll_interval_secs = parse_seconds(ENV_POLL_INTERVAL, &raw)?;
        }
        if let Some(raw) = normalize_text_option(lookup(ENV_REQUEST_TIMEOUT)) {
            self.request_timeout_secs = parse_seconds(ENV_REQUEST_TIMEOUT, &raw)?;
        }
        self.validated()
    }

    /// Normalize the base URL and reject zero intervals.
    pub fn validated(mut self) -> Result<Self> {
        self.api_base_url = normalize_base_url(&self.api_base_url).map_err(Error::Config)?;
        if self.poll_interval_secs == 0 {
            return Err(Error::Config(
                "poll interval must be at least one second".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config(
                "request timeout must be at least one second".to_string(),
            ));
        }
        Ok(self)
    }

    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_seconds(key: &str, raw: &str) -> Result<u64> {
    raw.parse::<u64>()
        .map_err(|error| Error::Config(format!("{key} must be a whole number of seconds: {error}")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(values: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = values
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |key| values.get(key).cloned()
    }

    #[test]
    fn defaults_poll_every_thirty_seconds() {
        let config = ClientConfig::default().validated().unwrap();
        assert_eq!(config.poll_interval(), Duration::from_secs(30));
    }

    #[test]
    fn overrides_replace_defaults() {
        let config = ClientConfig::default()
            .with_overrides(lookup(&[
                (ENV_API_URL, " https://groupwork.example.edu/ "),
                (ENV_POLL_INTERVAL, "45"),
            ]))
            .unwrap();
        assert_eq!(config.api_base_url, "https://groupwork.example.edu");
        assert_eq!(config.poll_interval_secs, 45);
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn overrides_reject_bad_values() {
        assert!(ClientConfig::default()
            .with_overrides(lookup(&[(ENV_POLL_INTERVAL, "soon")]))
            .is_err());
        assert!(ClientConfig::default()
            .with_overrides(lookup(&[(ENV_POLL_INTERVAL, "0")]))
            .is_err());
        assert!(ClientConfig::default()
            .with_overrides(lookup(&[(ENV_API_URL, "groupwork.example.edu")]))
            .is_err());
    }

    #[test]
    fn config_rejects_unknown_fields() {
        let error = serde_json::from_str::<ClientConfig>(
            r#"{"api_base_url": "https://a.example", "retries": 3}"#,
        )
        .unwrap_err();
        assert!(error.to_string().contains("unknown field"));
    }
}
