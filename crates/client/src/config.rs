//! Runtime configuration read from the environment.

use std::str::FromStr;

use stream_monitor_shared::{socket_scheme, ConnectionError, WS_PATH};
use url::Url;

use crate::ws::ReconnectConfig;

pub const ENV_URL: &str = "STREAM_MONITOR_URL";
pub const ENV_RECONNECT_DELAY_MS: &str = "STREAM_MONITOR_RECONNECT_DELAY_MS";
pub const ENV_RECONNECT_MAX_ATTEMPTS: &str = "STREAM_MONITOR_RECONNECT_MAX_ATTEMPTS";
pub const ENV_RECONNECT_BACKOFF: &str = "STREAM_MONITOR_RECONNECT_BACKOFF";
pub const ENV_RECONNECT_MAX_DELAY_MS: &str = "STREAM_MONITOR_RECONNECT_MAX_DELAY_MS";

pub const DEFAULT_URL: &str = "http://localhost:8080";

/// Where the monitor backend lives and how to keep the socket up.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Page origin of the backend; REST paths and the socket hang off it.
    pub base_url: Url,
    pub reconnect: ReconnectConfig,
}

impl MonitorConfig {
    /// Config for `base_url` with the default reconnect policy.
    pub fn new(base_url: &str) -> Result<Self, ConnectionError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            reconnect: ReconnectConfig::default(),
        })
    }

    pub fn from_env() -> Result<Self, ConnectionError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparseable numbers fall back to
    /// their defaults; an invalid URL is an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConnectionError> {
        let url = lookup(ENV_URL).unwrap_or_else(|| DEFAULT_URL.to_string());
        let defaults = ReconnectConfig::default();

        let reconnect = ReconnectConfig {
            initial_delay_ms: number(&lookup, ENV_RECONNECT_DELAY_MS, defaults.initial_delay_ms),
            max_attempts: number(&lookup, ENV_RECONNECT_MAX_ATTEMPTS, defaults.max_attempts),
            backoff_multiplier: number(&lookup, ENV_RECONNECT_BACKOFF, defaults.backoff_multiplier),
            max_delay_ms: number(&lookup, ENV_RECONNECT_MAX_DELAY_MS, defaults.max_delay_ms),
        };

        Ok(Self {
            base_url: parse_base_url(&url)?,
            reconnect,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConnectionError> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// `scheme://host[:port]` of the backend, without a trailing slash.
    pub fn origin(&self) -> String {
        self.base_url.origin().ascii_serialization()
    }

    /// Push endpoint: the base URL with its scheme mirrored to `ws`/`wss`
    /// and the path set to `/ws`.
    pub fn ws_url(&self) -> Result<Url, ConnectionError> {
        let mut url = self.base_url.clone();
        url.set_scheme(socket_scheme(self.base_url.scheme()))
            .map_err(|_| ConnectionError::InvalidUrl(self.base_url.to_string()))?;
        url.set_path(WS_PATH);
        url.set_query(None);
        url.set_fragment(None);
        Ok(url)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConnectionError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConnectionError::InvalidUrl(format!("{raw}: {e}")))?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        _ => Err(ConnectionError::InvalidUrl(raw.to_string())),
    }
}

fn number<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(key, value = %raw, "invalid number, using default");
            default
        }
    }
}
