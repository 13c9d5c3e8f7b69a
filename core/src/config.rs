//! Client configuration loaded from JSON or the environment.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::async_client::DEFAULT_WORKERS;
use crate::error::{Error, Result};
use crate::types::Auth;

const ENV_BASE_URL: &str = "DEVOURER_BASE_URL";
const ENV_LOAD_JSON: &str = "DEVOURER_LOAD_JSON";
const ENV_THROW_ON_ERROR: &str = "DEVOURER_THROW_ON_ERROR";
const ENV_WORKERS: &str = "DEVOURER_WORKERS";
const ENV_TIMEOUT_SECS: &str = "DEVOURER_TIMEOUT_SECS";
const ENV_USERNAME: &str = "DEVOURER_USERNAME";
const ENV_PASSWORD: &str = "DEVOURER_PASSWORD";
const ENV_TOKEN: &str = "DEVOURER_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<Auth>,
    #[serde(default)]
    pub load_json: bool,
    #[serde(default)]
    pub throw_on_error: bool,
    /// Worker threads for `AsyncClient`.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Total per-request timeout for the default transport.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth: None,
            load_json: false,
            throw_on_error: false,
            workers: DEFAULT_WORKERS,
            timeout_secs: None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read `DEVOURER_*` variables from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read `DEVOURER_*` keys through `lookup`.
    ///
    /// `DEVOURER_BASE_URL` is required. Credentials come from
    /// `DEVOURER_TOKEN`, or from `DEVOURER_USERNAME` together with
    /// `DEVOURER_PASSWORD`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = lookup(ENV_BASE_URL)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| Error::Config(format!("{ENV_BASE_URL} is not set")))?;
        let mut config = Self::new(base_url);

        if let Some(value) = lookup(ENV_LOAD_JSON) {
            config.load_json = parse_flag(ENV_LOAD_JSON, &value)?;
        }
        if let Some(value) = lookup(ENV_THROW_ON_ERROR) {
            config.throw_on_error = parse_flag(ENV_THROW_ON_ERROR, &value)?;
        }
        if let Some(value) = lookup(ENV_WORKERS) {
            config.workers = parse_number(ENV_WORKERS, &value)?;
        }
        if let Some(value) = lookup(ENV_TIMEOUT_SECS) {
            config.timeout_secs = Some(parse_number(ENV_TIMEOUT_SECS, &value)?);
        }

        config.auth = match (lookup(ENV_TOKEN), lookup(ENV_USERNAME), lookup(ENV_PASSWORD)) {
            (Some(token), None, None) => Some(Auth::Bearer(token)),
            (None, Some(username), Some(password)) => Some(Auth::Basic { username, password }),
            (None, None, None) => None,
            _ => {
                return Err(Error::Config(format!(
                    "set either {ENV_TOKEN} or both {ENV_USERNAME} and {ENV_PASSWORD}"
                )))
            }
        };

        Ok(config)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!("{key}: expected a boolean, got `{other}`"))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key}: expected a number, got `{value}`")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn json_defaults() {
        let config = ClientConfig::from_json(r#"{"base_url":"http://api/"}"#).unwrap();
        assert_eq!(config, ClientConfig::new("http://api/"));
        assert_eq!(config.workers, 2);
        assert!(config.timeout().is_none());
    }

    #[test]
    fn json_full() {
        let config = ClientConfig::from_json(
            r#"{
                "base_url": "http://api/",
                "auth": {"bearer": "t"},
                "load_json": true,
                "throw_on_error": true,
                "workers": 8,
                "timeout_secs": 3
            }"#,
        )
        .unwrap();
        assert_eq!(config.auth, Some(Auth::bearer("t")));
        assert!(config.load_json && config.throw_on_error);
        assert_eq!(config.workers, 8);
        assert_eq!(config.timeout(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn json_without_base_url_fails() {
        let err = ClientConfig::from_json(r#"{"load_json":true}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn env_requires_base_url() {
        let err = ClientConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("DEVOURER_BASE_URL")));
    }

    #[test]
    fn env_reads_flags_and_basic_auth() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("DEVOURER_BASE_URL", "http://api/"),
            ("DEVOURER_LOAD_JSON", "yes"),
            ("DEVOURER_THROW_ON_ERROR", "0"),
            ("DEVOURER_WORKERS", "4"),
            ("DEVOURER_TIMEOUT_SECS", "10"),
            ("DEVOURER_USERNAME", "user"),
            ("DEVOURER_PASSWORD", "password"),
        ]))
        .unwrap();
        assert!(config.load_json);
        assert!(!config.throw_on_error);
        assert_eq!(config.workers, 4);
        assert_eq!(config.timeout_secs, Some(10));
        assert_eq!(config.auth, Some(Auth::basic("user", "password")));
    }

    #[test]
    fn env_rejects_bad_values() {
        let err = ClientConfig::from_lookup(lookup(&[
            ("DEVOURER_BASE_URL", "http://api/"),
            ("DEVOURER_LOAD_JSON", "maybe"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = ClientConfig::from_lookup(lookup(&[
            ("DEVOURER_BASE_URL", "http://api/"),
            ("DEVOURER_WORKERS", "many"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn env_rejects_ambiguous_credentials() {
        let err = ClientConfig::from_lookup(lookup(&[
            ("DEVOURER_BASE_URL", "http://api/"),
            ("DEVOURER_TOKEN", "t"),
            ("DEVOURER_USERNAME", "user"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
