//! Runtime configuration of the realtime client, read from the environment.

use std::str::FromStr;

use thiserror::Error;

use crate::infrastructure::auth::Credential;
use crate::infrastructure::websocket::{Endpoints, ReconnectPolicy};

const DEFAULT_WS_URL: &str = "ws://localhost:8000";

/// Invalid configuration value.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unsupported URL scheme '{0}', expected ws, wss, http or https")]
    UnsupportedScheme(String),

    #[error("URL has no host: {0}")]
    MissingHost(String),

    #[error("Invalid URL '{value}': {source}")]
    InvalidUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("{key} must be a non-negative integer, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },
}

/// Everything the realtime layer needs to start.
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    pub endpoints: Endpoints,
    pub reconnect: ReconnectPolicy,
    /// Credential to log in with at startup, if any.
    pub token: Option<Credential>,
    /// Caro room to follow with the game socket, if any.
    pub caro_room: Option<String>,
}

impl RealtimeConfig {
    /// Read `PLAYHUB_*` variables from the process environment.
    ///
    /// Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let ws_url = non_empty("PLAYHUB_WS_URL").unwrap_or_else(|| DEFAULT_WS_URL.to_string());
        let endpoints = Endpoints::parse(ws_url.trim())?;

        let defaults = ReconnectPolicy::default();
        let reconnect = ReconnectPolicy {
            base_delay_ms: number(&non_empty, "PLAYHUB_RECONNECT_BASE_MS", defaults.base_delay_ms)?,
            max_delay_ms: number(&non_empty, "PLAYHUB_RECONNECT_MAX_MS", defaults.max_delay_ms)?,
            max_attempts: number(
                &non_empty,
                "PLAYHUB_RECONNECT_MAX_ATTEMPTS",
                defaults.max_attempts,
            )?,
        };

        Ok(Self {
            endpoints,
            reconnect,
            token: non_empty("PLAYHUB_TOKEN").map(|token| Credential::new(token.trim())),
            caro_room: non_empty("PLAYHUB_CARO_ROOM").map(|room| room.trim().to_string()),
        })
    }
}

fn number<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<RealtimeConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RealtimeConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = config(&[]).unwrap();

        assert_eq!(config.endpoints.base().as_str(), "ws://localhost:8000/");
        assert_eq!(config.reconnect, ReconnectPolicy::default());
        assert!(config.token.is_none());
        assert!(config.caro_room.is_none());
    }

    #[test]
    fn reads_every_variable() {
        let config = config(&[
            ("PLAYHUB_WS_URL", "https://play.example.com"),
            ("PLAYHUB_RECONNECT_BASE_MS", "500"),
            ("PLAYHUB_RECONNECT_MAX_MS", "10000"),
            ("PLAYHUB_RECONNECT_MAX_ATTEMPTS", "3"),
            ("PLAYHUB_TOKEN", "secret"),
            ("PLAYHUB_CARO_ROOM", "lobby"),
        ])
        .unwrap();

        assert_eq!(config.endpoints.base().scheme(), "wss");
        assert_eq!(
            config.reconnect,
            ReconnectPolicy {
                base_delay_ms: 500,
                max_delay_ms: 10_000,
                max_attempts: 3,
            }
        );
        assert_eq!(config.token.as_ref().map(Credential::expose), Some("secret"));
        assert_eq!(config.caro_room.as_deref(), Some("lobby"));
    }

    #[test]
    fn blank_token_means_logged_out() {
        let config = config(&[("PLAYHUB_TOKEN", "   ")]).unwrap();
        assert!(config.token.is_none());
    }

    #[test]
    fn rejects_bad_numbers() {
        let err = config(&[("PLAYHUB_RECONNECT_MAX_ATTEMPTS", "many")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidNumber {
                key: "PLAYHUB_RECONNECT_MAX_ATTEMPTS",
                ..
            }
        ));
    }

    #[test]
    fn rejects_bad_urls() {
        assert!(matches!(
            config(&[("PLAYHUB_WS_URL", "ftp://example.com")]),
            Err(ConfigError::UnsupportedScheme(_))
        ));
    }
}
