//! Client configuration.
//!
//! # Design
//! Every field has a serde default, so an empty JSON object is a valid
//! config pointing at the production API with the standard connection
//! timeout and no user agent. The user agent is optional here because
//! `RestClient::set_user_agent` can still supply it later.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root of the social-news web API. Request paths are appended verbatim.
pub const REDDIT_BASE_URL: &str = "https://www.reddit.com";

/// Bound on establishing a new TCP/TLS connection, in milliseconds. ureq
/// has no separate limit on waiting for a pooled connection.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

/// Settings used by `RestClient::from_config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub connect_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: REDDIT_BASE_URL.to_string(),
            user_agent: None,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
        }
    }
}

impl ClientConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}
