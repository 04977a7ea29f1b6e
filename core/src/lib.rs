//! Synchronous REST client core for a social-news web API.
//!
//! # Overview
//! `RestClient` issues GET and POST requests against one base URL with a
//! fixed user agent and a per-call session cookie. Requests are assembled by
//! method builders, executed by a `Transport`, and parsed by a
//! `ResponseHandler`.
//!
//! # Design
//! - Requests and responses cross the transport boundary as plain data
//!   (`HttpRequest` / `HttpResponse`), so tests can replace the network.
//! - `UreqTransport` is the default transport: blocking, pooled, cookie jar
//!   disabled, 10 second connection timeout.
//! - Every public operation returns `Result`. The path-based `get`/`post`
//!   log exchange failures and return `Ok(None)`; the builder-based
//!   `get_with`/`post_with` propagate them.
//! - Logging goes through `tracing`; the crate never installs a subscriber.

pub mod builder;
pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod params;
pub mod transport;

pub use builder::{http_get_method, http_post_method, GetMethodBuilder, PostMethodBuilder};
pub use client::RestClient;
pub use config::{ClientConfig, REDDIT_BASE_URL};
pub use error::RestError;
pub use handler::{JsonResponseHandler, Response, ResponseHandler};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use params::{FormParams, ParamError};
pub use transport::{Transport, UreqTransport};
