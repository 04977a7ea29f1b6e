//! Error types for the REST client.
//!
//! # Design
//! Two tiers. `UserAgentNotSet` and `Params` are caller mistakes: nothing
//! was sent, and retrying the same call cannot succeed. Every other variant
//! describes a failed exchange with the server and is "recoverable" in the
//! sense that the high-level `get`/`post` entry points log it and return
//! `Ok(None)` instead of surfacing it.

use thiserror::Error;

use crate::params::ParamError;

/// Errors returned by `RestClient` and its collaborators.
#[derive(Debug, Error)]
pub enum RestError {
    /// No user agent has been configured on the client.
    #[error("user agent not set")]
    UserAgentNotSet,

    /// The `api_params` string handed to `post` is malformed.
    #[error("invalid request parameters: {0}")]
    Params(#[from] ParamError),

    /// The request URL could not be parsed.
    #[error("invalid URI {uri:?}: {reason}")]
    InvalidUri { uri: String, reason: String },

    /// The transport failed to complete the exchange.
    #[error("I/O error: {0}")]
    Io(String),

    /// The transport gave up waiting on the server.
    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be parsed.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// The form body could not be URL-encoded.
    #[error("failed to encode form body: {0}")]
    Encode(String),
}

impl RestError {
    /// Whether this error came from the exchange itself rather than from
    /// misuse of the client.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, RestError::UserAgentNotSet | RestError::Params(_))
    }
}

impl From<serde_json::Error> for RestError {
    fn from(err: serde_json::Error) -> Self {
        RestError::Parse(err.to_string())
    }
}

impl From<ureq::Error> for RestError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Timeout(_) => RestError::Timeout,
            ureq::Error::BadUri(reason) => RestError::InvalidUri {
                uri: String::new(),
                reason,
            },
            other => RestError::Io(other.to_string()),
        }
    }
}
