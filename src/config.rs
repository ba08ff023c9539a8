//! Client configuration.
//!
//! The server endpoint comes from the environment and falls back to the
//! local development server. Reconnection is delegated to the transport;
//! the policy here is only handed to it when a channel is opened.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable holding the server endpoint.
pub const SERVER_URL_ENV: &str = "WHODUNIT_WS_URL";

/// Endpoint used when [`SERVER_URL_ENV`] is unset.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8765";

/// Default number of reconnection attempts the transport makes.
pub const DEFAULT_RECONNECT_ATTEMPTS: u32 = 5;

/// Default fixed delay between reconnection attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Bounded, fixed-backoff reconnection policy for the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconnectPolicy {
    /// Attempts before the transport gives up.
    pub max_attempts: u32,
    /// Delay between attempts.
    #[serde(with = "duration_millis")]
    pub delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RECONNECT_ATTEMPTS,
            delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

/// Connection settings for a [`GameClient`](crate::client::GameClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server endpoint address.
    pub server_url: String,
    /// Retry policy handed to the transport.
    pub reconnect: ReconnectPolicy,
    /// Skip long-polling and open a websocket directly.
    pub websocket_only: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            reconnect: ReconnectPolicy::default(),
            websocket_only: true,
        }
    }
}

impl ClientConfig {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            ..Self::default()
        }
    }

    /// Load from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        match lookup(SERVER_URL_ENV).filter(|url| !url.trim().is_empty()) {
            Some(url) => Self::new(url.trim()),
            None => Self::default(),
        }
    }

    #[must_use]
    pub fn with_server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = server_url.into();
        self
    }

    #[must_use]
    pub fn with_reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
