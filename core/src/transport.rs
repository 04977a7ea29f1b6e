//! Transports execute an `HttpRequest` and hand the result to a handler.
//!
//! # Design
//! `Transport::send` is the only method an implementation must provide; it
//! reports failures to reach the server as errors and returns every HTTP
//! status as data, so interpreting a 404 or a 500 is the handler's job.
//! `UreqTransport` wraps one shared `ureq::Agent` that pools connections
//! across calls. ureq is built without its cookie jar, so the only cookie a
//! request carries is the explicit header set by the method builder.

use std::time::Duration;

use tracing::debug;

use crate::config::DEFAULT_CONNECT_TIMEOUT_MS;
use crate::error::RestError;
use crate::handler::{Response, ResponseHandler};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Performs the network exchange for a request.
pub trait Transport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, RestError>;

    /// Send `request` and let `handler` produce the result.
    fn execute(&self, request: &HttpRequest, handler: &dyn ResponseHandler) -> Result<Response, RestError> {
        let response = self.send(request)?;
        handler.handle(response)
    }
}

/// Blocking transport backed by `ureq`.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS))
    }
}

impl UreqTransport {
    /// `connect_timeout` bounds how long ureq may spend establishing the TCP
    /// (and TLS) connection to the server. Reusing a pooled connection is
    /// not subject to it, and there is no overall request deadline.
    pub fn new(connect_timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_connect(Some(connect_timeout))
            .build()
            .new_agent();
        Self { agent }
    }

    /// Wrap an agent configured by the caller. It should keep
    /// `http_status_as_error(false)` so statuses reach the handler.
    pub fn from_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, RestError> {
        debug!(method = request.method.as_str(), url = %request.url, "sending request");

        let result = match request.method {
            HttpMethod::Get => {
                let mut builder = self.agent.get(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            HttpMethod::Post => {
                let mut builder = self.agent.post(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                match &request.body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };
        let mut response = result?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.body_mut().read_to_string()?;

        debug!(status, bytes = body.len(), "received response");
        Ok(HttpResponse { status, headers, body })
    }
}
