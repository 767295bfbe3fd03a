//! In-process stand-in for the collection API: records every request and
//! answers from a per-path response table.
#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use serde_json::Value;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sysprof::{ApiClient, Credentials};

pub const ACCESS: &str = "access-abc";
pub const REFRESH: &str = "refresh-xyz";

#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Value,
}

#[derive(Default)]
struct MockState {
    requests: Mutex<Vec<Recorded>>,
    responses: Mutex<HashMap<String, (u16, String)>>,
    delays: Mutex<HashMap<String, Duration>>,
}

pub struct MockApi {
    pub addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockApi {
    /// Start a server that authenticates, registers report `R123`, and accepts every submission with 201.
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new().fallback(handle).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock api");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        let api = Self { addr, state };
        api.respond(
            "/authenticate",
            200,
            &format!(r#"{{"access_token":"{ACCESS}","refresh_token":"{REFRESH}"}}"#),
        );
        api.respond("/api/report/new", 201, r#"{"report_id":"R123"}"#);
        api
    }

    pub fn respond(&self, path: &str, status: u16, body: &str) {
        self.state
            .responses
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body.to_string()));
    }

    /// Hold every response on `path` for `wait` before answering.
    pub fn delay(&self, path: &str, wait: Duration) {
        self.state
            .delays
            .lock()
            .unwrap()
            .insert(path.to_string(), wait);
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests().into_iter().filter(|r| r.path == path).collect()
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.base_url(), Duration::from_secs(5)).expect("client")
    }
}

async fn handle(
    State(state): State<Arc<MockState>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let text = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    state.requests.lock().unwrap().push(Recorded {
        path: path.clone(),
        authorization: text(header::AUTHORIZATION),
        content_type: text(header::CONTENT_TYPE),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    });
    let wait = state.delays.lock().unwrap().get(&path).copied();
    if let Some(wait) = wait {
        tokio::time::sleep(wait).await;
    }
    let (status, body) = state
        .responses
        .lock()
        .unwrap()
        .get(&path)
        .cloned()
        .unwrap_or((201, r#"{"status":"ok"}"#.to_string()));
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

pub fn credentials() -> Credentials {
    Credentials {
        email: "ops@example.com".into(),
        password: "hunter2".into(),
    }
}

/// An address nothing listens on.
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
