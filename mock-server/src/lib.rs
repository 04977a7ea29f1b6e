use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Everything the server saw about a request to `/echo`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Echo {
    pub method: String,
    pub user_agent: Option<String>,
    pub cookie: Option<String>,
    pub content_type: Option<String>,
    pub form: Vec<(String, String)>,
}

/// Session id -> user name.
pub type Sessions = Arc<RwLock<HashMap<String, String>>>;

pub const SESSION_COOKIE: &str = "reddit_session";

pub fn app() -> Router {
    let sessions: Sessions = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/echo", get(echo).post(echo))
        .route("/api/login", post(login))
        .route("/api/me.json", get(me))
        .route("/r/{subreddit}/about.json", get(subreddit_about))
        .route("/broken", get(broken))
        .with_state(sessions)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn parse_form(body: &str) -> Result<Vec<(String, String)>, StatusCode> {
    serde_urlencoded::from_str(body).map_err(|_| StatusCode::BAD_REQUEST)
}

async fn echo(method: Method, headers: HeaderMap, body: String) -> Result<Json<Echo>, StatusCode> {
    Ok(Json(Echo {
        method: method.to_string(),
        user_agent: header_value(&headers, header::USER_AGENT),
        cookie: header_value(&headers, header::COOKIE),
        content_type: header_value(&headers, header::CONTENT_TYPE),
        form: parse_form(&body)?,
    }))
}

async fn login(State(sessions): State<Sessions>, body: String) -> Result<Json<Value>, StatusCode> {
    let form: HashMap<String, String> = parse_form(&body)?.into_iter().collect();
    let user = form.get("user").filter(|u| !u.is_empty());
    let passwd = form.get("passwd").filter(|p| !p.is_empty());

    let (Some(user), Some(_)) = (user, passwd) else {
        return Ok(Json(json!({
            "json": { "errors": [["WRONG_PASSWORD", "wrong password", "passwd"]] }
        })));
    };

    let session = Uuid::new_v4().simple().to_string();
    sessions.write().await.insert(session.clone(), user.clone());
    Ok(Json(json!({
        "json": {
            "errors": [],
            "data": { "modhash": Uuid::new_v4().simple().to_string(), "cookie": session }
        }
    })))
}

/// Logged-in user for the `reddit_session` cookie, or `{}` when the cookie
/// is missing or unknown.
async fn me(State(sessions): State<Sessions>, headers: HeaderMap) -> Json<Value> {
    let session = header_value(&headers, header::COOKIE).and_then(|cookie| {
        cookie
            .split(';')
            .filter_map(|c| c.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .map(|(_, value)| value.to_string())
    });

    let sessions = sessions.read().await;
    match session.and_then(|s| sessions.get(&s)) {
        Some(name) => Json(json!({ "kind": "t2", "data": { "name": name } })),
        None => Json(json!({})),
    }
}

async fn subreddit_about(Path(subreddit): Path<String>) -> Json<Value> {
    Json(json!({
        "kind": "t5",
        "data": { "display_name": subreddit, "url": format!("/r/{subreddit}/") }
    }))
}

async fn broken() -> (StatusCode, [(header::HeaderName, &'static str); 1], &'static str) {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html")],
        "<html><body>we took the site down for maintenance</body></html>",
    )
}
