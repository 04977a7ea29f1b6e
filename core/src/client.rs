//! Authenticated GET/POST calls against a single API base URL.
//!
//! # Design
//! `RestClient` owns a shared transport and a shared response handler and
//! holds no per-request state. The user agent is the one mutable field: it
//! sits behind a `RwLock` and every call takes a snapshot of it before
//! building the request, so a concurrent `set_user_agent` lands either
//! wholly before or wholly after any given request.
//!
//! There are two entry tiers:
//! - `get_with` / `post_with` take a method builder and propagate every
//!   failure as a `RestError`.
//! - `get` / `post` take a path and a cookie, log exchange failures
//!   (bad URI, I/O, status, parse) at error level and return `Ok(None)`.
//!   Caller mistakes, an unset user agent or malformed `api_params`, are
//!   still returned as `Err` because retrying cannot fix them.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, error};

use crate::builder::{http_get_method, http_post_method, GetMethodBuilder, PostMethodBuilder};
use crate::config::{ClientConfig, REDDIT_BASE_URL};
use crate::error::RestError;
use crate::handler::{JsonResponseHandler, Response, ResponseHandler};
use crate::params::FormParams;
use crate::transport::{Transport, UreqTransport};

/// Synchronous client for the social-news REST API.
pub struct RestClient {
    transport: Arc<dyn Transport>,
    handler: Arc<dyn ResponseHandler>,
    base_url: String,
    user_agent: RwLock<Option<String>>,
}

impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url)
            .field("user_agent", &self.user_agent())
            .finish_non_exhaustive()
    }
}

impl RestClient {
    /// Client using the default transport and JSON handler, with the user
    /// agent set to `client_name/client_version`.
    pub fn new(client_name: &str, client_version: &str) -> Self {
        let client = Self::with_parts(Arc::new(UreqTransport::default()), Arc::new(JsonResponseHandler));
        client.set_client_user_agent(client_name, client_version);
        client
    }

    /// Client using the supplied transport and handler. The user agent
    /// starts unset; call `set_user_agent` before issuing requests.
    pub fn with_parts(transport: Arc<dyn Transport>, handler: Arc<dyn ResponseHandler>) -> Self {
        Self {
            transport,
            handler,
            base_url: REDDIT_BASE_URL.to_string(),
            user_agent: RwLock::new(None),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        let transport = UreqTransport::new(config.connect_timeout());
        let client = Self::with_parts(Arc::new(transport), Arc::new(JsonResponseHandler))
            .with_base_url(&config.base_url);
        if let Some(agent) = &config.user_agent {
            client.set_user_agent(agent.as_str());
        }
        client
    }

    /// Replace the base URL that request paths are appended to.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Replace the user agent. The string is sent as-is; include a version
    /// or use `set_client_user_agent`.
    pub fn set_user_agent(&self, agent: impl Into<String>) {
        let mut slot = self.user_agent.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(agent.into());
    }

    /// Set the user agent to `client_name/client_version`.
    pub fn set_client_user_agent(&self, client_name: &str, client_version: &str) {
        self.set_user_agent(format!("{client_name}/{client_version}"));
    }

    pub fn user_agent(&self) -> Option<String> {
        self.user_agent
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn require_user_agent(&self) -> Result<String, RestError> {
        self.user_agent().ok_or(RestError::UserAgentNotSet)
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET `base_url + path`. Exchange failures are logged and yield
    /// `Ok(None)`.
    pub fn get(&self, path: &str, cookie: Option<&str>) -> Result<Option<Response>, RestError> {
        let builder = http_get_method().with_url(self.url_for(path)).with_cookie(cookie);
        recover(self.get_with(builder), "GET", path)
    }

    /// GET using a pre-configured builder; the client's user agent
    /// replaces any agent set on the builder.
    pub fn get_with(&self, builder: GetMethodBuilder) -> Result<Response, RestError> {
        let agent = self.require_user_agent()?;
        let request = builder.with_user_agent(agent).build()?;
        let response = self.transport.execute(&request, self.handler.as_ref())?;
        debug!(url = %request.url, status = response.status(), "GET completed");
        Ok(response)
    }

    /// POST `api_params` (`name=value&name=value`) as a form to
    /// `base_url + path`. Exchange failures are logged and yield `Ok(None)`.
    pub fn post(
        &self,
        api_params: Option<&str>,
        path: &str,
        cookie: Option<&str>,
    ) -> Result<Option<Response>, RestError> {
        let params = FormParams::parse(api_params)?;
        let builder = http_post_method().with_url(self.url_for(path)).with_cookie(cookie);
        recover(self.post_with(builder, params), "POST", path)
    }

    /// POST `params` as a form using a pre-configured builder.
    pub fn post_with<I, K, V>(&self, builder: PostMethodBuilder, params: I) -> Result<Response, RestError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let params: FormParams = params.into_iter().collect();
        let agent = self.require_user_agent()?;
        let request = builder.with_user_agent(agent).build(&params)?;
        let response = self.transport.execute(&request, self.handler.as_ref())?;
        debug!(url = %request.url, status = response.status(), params = params.len(), "POST completed");
        Ok(response)
    }
}

/// Log recoverable failures and turn them into `Ok(None)`.
fn recover(result: Result<Response, RestError>, method: &str, path: &str) -> Result<Option<Response>, RestError> {
    match result {
        Ok(response) => Ok(Some(response)),
        Err(err) if err.is_recoverable() => {
            match &err {
                RestError::InvalidUri { .. } => error!(%method, %path, %err, "bad request path"),
                RestError::Parse(_) => error!(%method, %path, %err, "could not parse response"),
                _ => error!(%method, %path, %err, "request failed"),
            }
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tracing_subscriber::fmt::MakeWriter;

    use super::*;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};
    use crate::params::ParamError;

    /// Records every request and answers from a fixed script.
    struct FakeTransport {
        seen: Mutex<Vec<HttpRequest>>,
        reply: Result<(u16, &'static str), &'static str>,
    }

    impl FakeTransport {
        fn ok(body: &'static str) -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
                reply: Ok((200, body)),
            })
        }

        fn status(status: u16, body: &'static str) -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
                reply: Ok((status, body)),
            })
        }

        fn failing(message: &'static str) -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
                reply: Err(message),
            })
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl Transport for FakeTransport {
        fn send(&self, request: &HttpRequest) -> Result<HttpResponse, RestError> {
            self.seen.lock().unwrap().push(request.clone());
            match self.reply {
                Ok((status, body)) => Ok(HttpResponse {
                    status,
                    headers: Vec::new(),
                    body: body.to_string(),
                }),
                Err(message) => Err(RestError::Io(message.to_string())),
            }
        }
    }

    /// In-memory sink for a scoped `fmt` subscriber.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Run `f` with ERROR-level events captured as plain text.
    fn capture_errors<T>(f: impl FnOnce() -> T) -> (T, String) {
        let buffer = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(buffer.clone())
            .with_max_level(tracing::Level::ERROR)
            .with_ansi(false)
            .finish();
        let result = tracing::subscriber::with_default(subscriber, f);
        let logs = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        (result, logs)
    }

    fn client(transport: &Arc<FakeTransport>) -> RestClient {
        RestClient::with_parts(transport.clone(), Arc::new(JsonResponseHandler)).with_base_url("https://example.com")
    }

    #[test]
    fn get_targets_base_url_plus_path() {
        let transport = FakeTransport::ok(r#"{"ok":true}"#);
        let client = client(&transport);
        client.set_client_user_agent("app", "1.0");

        let resp = client.get("/foo", Some("reddit_session=abc")).unwrap().unwrap();
        assert_eq!(resp.parsed()["ok"], true);

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, HttpMethod::Get);
        assert_eq!(requests[0].url, "https://example.com/foo");
        assert_eq!(requests[0].header("user-agent"), Some("app/1.0"));
        assert_eq!(requests[0].header("cookie"), Some("reddit_session=abc"));
    }

    #[test]
    fn get_without_cookie_sends_no_cookie_header() {
        let transport = FakeTransport::ok("{}");
        let client = client(&transport);
        client.set_user_agent("app/1.0");

        client.get("/foo", None).unwrap().unwrap();
        assert!(transport.requests()[0].header("cookie").is_none());
    }

    #[test]
    fn unset_user_agent_fails_every_entry_point() {
        let transport = FakeTransport::ok("{}");
        let client = client(&transport);

        assert!(matches!(client.get("/foo", None), Err(RestError::UserAgentNotSet)));
        assert!(matches!(
            client.post(Some("a=1"), "/foo", None),
            Err(RestError::UserAgentNotSet)
        ));
        assert!(matches!(
            client.get_with(http_get_method().with_url("https://example.com/foo")),
            Err(RestError::UserAgentNotSet)
        ));
        let no_params: [(&str, &str); 0] = [];
        assert!(matches!(
            client.post_with(http_post_method().with_url("https://example.com/foo"), no_params),
            Err(RestError::UserAgentNotSet)
        ));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn io_failure_is_swallowed_by_get_and_propagated_by_get_with() {
        let transport = FakeTransport::failing("connection reset");
        let client = client(&transport);
        client.set_user_agent("app/1.0");

        assert!(client.get("/foo", None).unwrap().is_none());

        let err = client
            .get_with(http_get_method().with_url("https://example.com/foo"))
            .unwrap_err();
        assert!(matches!(err, RestError::Io(ref m) if m == "connection reset"));
    }

    #[test]
    fn parse_and_status_failures_yield_none() {
        let client_a = client(&FakeTransport::ok("not json"));
        client_a.set_user_agent("app/1.0");
        assert!(client_a.get("/foo", None).unwrap().is_none());

        let client_b = client(&FakeTransport::status(403, r#"{"error":403}"#));
        client_b.set_user_agent("app/1.0");
        assert!(client_b.post(None, "/api/vote", None).unwrap().is_none());
    }

    #[test]
    fn bad_base_url_yields_none_without_sending() {
        let transport = FakeTransport::ok("{}");
        let client = RestClient::with_parts(transport.clone(), Arc::new(JsonResponseHandler)).with_base_url("");
        client.set_user_agent("app/1.0");

        assert!(client.get("/foo", None).unwrap().is_none());
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn post_sends_params_in_order() {
        let transport = FakeTransport::ok(r#"{"json":{"errors":[]}}"#);
        let client = client(&transport);
        client.set_client_user_agent("app", "1.0");

        client
            .post(Some("a=1&b=2&c=3"), "/api/comment", Some("reddit_session=abc"))
            .unwrap()
            .unwrap();

        let req = &transport.requests()[0];
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "https://example.com/api/comment");
        assert_eq!(req.body.as_deref(), Some("a=1&b=2&c=3"));
        assert_eq!(req.header("user-agent"), Some("app/1.0"));
        assert_eq!(req.header("cookie"), Some("reddit_session=abc"));
    }

    #[test]
    fn post_with_absent_or_empty_params_sends_empty_body() {
        let transport = FakeTransport::ok("{}");
        let client = client(&transport);
        client.set_user_agent("app/1.0");

        client.post(None, "/api/logout", None).unwrap().unwrap();
        client.post(Some(""), "/api/logout", None).unwrap().unwrap();

        for req in transport.requests() {
            assert_eq!(req.body.as_deref(), Some(""));
        }
    }

    #[test]
    fn malformed_params_are_rejected_before_sending() {
        let transport = FakeTransport::ok("{}");
        let client = client(&transport);
        client.set_user_agent("app/1.0");

        let err = client.post(Some("a=1&b"), "/api/comment", None).unwrap_err();
        assert!(matches!(
            err,
            RestError::Params(ParamError::MissingSeparator { index: 1, .. })
        ));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn post_with_accepts_structured_params() {
        let transport = FakeTransport::ok("{}");
        let client = client(&transport);
        client.set_user_agent("app/1.0");

        let params = vec![("thing_id".to_string(), "t3_abc".to_string()), ("dir".to_string(), "1".to_string())];
        client
            .post_with(http_post_method().with_url("https://example.com/api/vote"), params)
            .unwrap();
        client
            .post_with(
                http_post_method().with_url("https://example.com/api/vote"),
                [("thing_id", "t3_def"), ("dir", "-1")],
            )
            .unwrap();

        let parsed = FormParams::parse(Some("thing_id=t3_ghi&dir=0")).unwrap();
        client
            .post_with(http_post_method().with_url("https://example.com/api/vote"), parsed)
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].body.as_deref(), Some("thing_id=t3_abc&dir=1"));
        assert_eq!(requests[1].body.as_deref(), Some("thing_id=t3_def&dir=-1"));
        assert_eq!(requests[2].body.as_deref(), Some("thing_id=t3_ghi&dir=0"));
    }

    #[test]
    fn swallowed_failure_is_logged_once_at_error_level() {
        let transport = FakeTransport::failing("connection reset");
        let client = client(&transport);
        client.set_user_agent("app/1.0");

        let (result, logs) = capture_errors(|| client.get("/r/rust/about.json", None));
        assert!(result.unwrap().is_none());
        let lines: Vec<&str> = logs.lines().filter(|l| l.contains("ERROR")).collect();
        assert_eq!(lines.len(), 1, "logs: {logs}");
        assert!(lines[0].contains("/r/rust/about.json"));
        assert!(lines[0].contains("connection reset"));
    }

    #[test]
    fn propagated_failure_is_not_logged() {
        let transport = FakeTransport::failing("connection reset");
        let client = client(&transport);
        client.set_user_agent("app/1.0");

        let (result, logs) =
            capture_errors(|| client.get_with(http_get_method().with_url("https://example.com/r/rust/about.json")));
        assert!(matches!(result, Err(RestError::Io(_))));
        assert!(logs.is_empty(), "logs: {logs}");
    }

    #[test]
    fn caller_errors_are_not_logged() {
        let client = client(&FakeTransport::ok("{}"));

        let (result, logs) = capture_errors(|| client.get("/foo", None));
        assert!(matches!(result, Err(RestError::UserAgentNotSet)));
        assert!(logs.is_empty(), "logs: {logs}");
    }

    #[test]
    fn client_agent_overrides_builder_agent() {
        let transport = FakeTransport::ok("{}");
        let client = client(&transport);
        client.set_user_agent("app/2.0");

        client
            .get_with(
                http_get_method()
                    .with_url("https://example.com/foo")
                    .with_user_agent("other/0.1"),
            )
            .unwrap();
        assert_eq!(transport.requests()[0].header("user-agent"), Some("app/2.0"));
    }

    #[test]
    fn set_user_agent_replaces_previous_value() {
        let client = client(&FakeTransport::ok("{}"));
        assert_eq!(client.user_agent(), None);
        client.set_client_user_agent("app", "1.0");
        assert_eq!(client.user_agent().as_deref(), Some("app/1.0"));
        client.set_user_agent("anything goes");
        assert_eq!(client.user_agent().as_deref(), Some("anything goes"));
    }

    #[test]
    fn new_sets_user_agent_and_default_base_url() {
        let client = RestClient::new("newsbot", "1.0.3");
        assert_eq!(client.user_agent().as_deref(), Some("newsbot/1.0.3"));
        assert_eq!(client.base_url(), "https://www.reddit.com");
    }

    #[test]
    fn from_config_applies_settings() {
        let config = ClientConfig {
            base_url: "http://127.0.0.1:3000/".to_string(),
            user_agent: Some("bot/0.1".to_string()),
            connect_timeout_ms: 250,
        };
        let client = RestClient::from_config(&config);
        assert_eq!(client.base_url(), "http://127.0.0.1:3000");
        assert_eq!(client.user_agent().as_deref(), Some("bot/0.1"));
    }

    #[test]
    fn client_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RestClient>();
    }
}
