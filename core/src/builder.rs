//! Method builders for GET and POST requests.
//!
//! # Design
//! A builder collects the absolute URL, the session cookie and the user
//! agent, then `build()` validates the URL and emits an `HttpRequest`.
//! The URL is sent exactly as given once it passes validation.
//! The cookie goes out verbatim in a `cookie` header; `None` or an empty
//! string means no header at all. `RestClient` overwrites the user agent
//! with its own before building, so callers of the low-level API only set
//! URL and cookie.

use ureq::http::Uri;
use url::Url;

use crate::error::RestError;
use crate::http::{HttpMethod, HttpRequest};
use crate::params::FormParams;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// Fields shared by both builders.
#[derive(Debug, Clone, Default)]
struct RequestParts {
    url: String,
    cookie: Option<String>,
    user_agent: Option<String>,
}

impl RequestParts {
    fn into_request(self, method: HttpMethod, body: Option<(String, &str)>) -> Result<HttpRequest, RestError> {
        validate_url(&self.url)?;

        let mut headers = Vec::new();
        if let Some(agent) = self.user_agent {
            headers.push(("user-agent".to_string(), agent));
        }
        if let Some(cookie) = self.cookie.filter(|c| !c.is_empty()) {
            headers.push(("cookie".to_string(), cookie));
        }

        let body = body.map(|(body, content_type)| {
            headers.push(("content-type".to_string(), content_type.to_string()));
            body
        });

        Ok(HttpRequest {
            method,
            url: self.url,
            headers,
            body,
        })
    }
}

/// Accept only absolute URLs that are also valid request URIs. The URL is
/// checked, never rewritten: dot-segments and missing trailing slashes go
/// out exactly as written.
fn validate_url(url: &str) -> Result<(), RestError> {
    let invalid = |reason: String| RestError::InvalidUri {
        uri: url.to_string(),
        reason,
    };
    Url::parse(url).map_err(|e| invalid(e.to_string()))?;
    url.parse::<Uri>().map_err(|e| invalid(e.to_string()))?;
    Ok(())
}

/// Builds GET requests.
#[derive(Debug, Clone, Default)]
pub struct GetMethodBuilder {
    parts: RequestParts,
}

/// Start a GET builder.
pub fn http_get_method() -> GetMethodBuilder {
    GetMethodBuilder::default()
}

impl GetMethodBuilder {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.parts.url = url.into();
        self
    }

    pub fn with_cookie(mut self, cookie: Option<&str>) -> Self {
        self.parts.cookie = cookie.map(str::to_string);
        self
    }

    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.parts.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<HttpRequest, RestError> {
        self.parts.into_request(HttpMethod::Get, None)
    }
}

/// Builds POST requests carrying a URL-encoded form body.
#[derive(Debug, Clone, Default)]
pub struct PostMethodBuilder {
    parts: RequestParts,
}

/// Start a POST builder.
pub fn http_post_method() -> PostMethodBuilder {
    PostMethodBuilder::default()
}

impl PostMethodBuilder {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.parts.url = url.into();
        self
    }

    pub fn with_cookie(mut self, cookie: Option<&str>) -> Self {
        self.parts.cookie = cookie.map(str::to_string);
        self
    }

    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.parts.user_agent = Some(agent.into());
        self
    }

    /// Build the request with `params` encoded as the body. An empty list
    /// produces an empty body, not a missing one.
    pub fn build(self, params: &FormParams) -> Result<HttpRequest, RestError> {
        let body = params.to_form_body()?;
        self.parts
            .into_request(HttpMethod::Post, Some((body, FORM_CONTENT_TYPE)))
    }
}
