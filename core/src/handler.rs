//! Response handlers and the domain `Response` type.
//!
//! # Design
//! A handler is invoked once per request, after the transport has produced
//! an `HttpResponse`. `JsonResponseHandler` is the default: non-2xx statuses
//! become `RestError::Status`, bodies that are not JSON become
//! `RestError::Parse`. Everything the API returns is JSON, so the parsed
//! value is kept alongside the raw text.

use serde::de::DeserializeOwned;

use crate::error::RestError;
use crate::http::HttpResponse;

/// A successfully parsed API response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: u16,
    text: String,
    parsed: serde_json::Value,
}

impl Response {
    pub fn new(status: u16, text: String, parsed: serde_json::Value) -> Self {
        Self { status, text, parsed }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// The body exactly as the server sent it.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn parsed(&self) -> &serde_json::Value {
        &self.parsed
    }

    pub fn into_parsed(self) -> serde_json::Value {
        self.parsed
    }

    /// Deserialize the parsed body into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, RestError> {
        T::deserialize(&self.parsed).map_err(RestError::from)
    }
}

/// Converts a raw `HttpResponse` into a `Response`.
pub trait ResponseHandler: Send + Sync {
    fn handle(&self, response: HttpResponse) -> Result<Response, RestError>;
}

/// Default handler for JSON endpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonResponseHandler;

impl ResponseHandler for JsonResponseHandler {
    fn handle(&self, response: HttpResponse) -> Result<Response, RestError> {
        if !response.is_success() {
            return Err(RestError::Status {
                status: response.status,
                body: response.body,
            });
        }
        let parsed = serde_json::from_str(&response.body)?;
        Ok(Response::new(response.status, response.body, parsed))
    }
}
