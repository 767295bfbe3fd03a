//! HTTP transport for the collection API: one POST per call, JSON in and out.

use reqwest::header;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::error::ApiError;
use crate::payload::Fields;

/// Fixed credential-exchange path.
pub const AUTHENTICATE_PATH: &str = "/authenticate";

// Error bodies are echoed into logs; keep them short.
const MAX_ERROR_BODY: usize = 512;

/// Statuses the API uses for success.
pub fn is_success(status: u16) -> bool {
    matches!(status, 200 | 201 | 202 | 204)
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ApiClient {
    /// Client for `base_url` (scheme, host, optional prefix) with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sysprof/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: None,
        })
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full request URL for `path`.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Authenticated POST of a pre-serialized JSON payload.
    ///
    /// Fails without touching the network when the path or payload is empty
    /// or when no access token is held.
    pub async fn send(&self, path: &str, payload: &[u8]) -> Result<Value, ApiError> {
        if path.is_empty() {
            return Err(ApiError::EmptyPath);
        }
        if payload.is_empty() {
            return Err(ApiError::EmptyPayload);
        }
        let token = self
            .access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::MissingToken {
                path: path.to_string(),
            })?;
        self.post(path, payload.to_vec(), Some(token)).await
    }

    /// Serialize `fields` and [`send`](Self::send) them.
    pub async fn send_fields(&self, path: &str, fields: &Fields) -> Result<Value, ApiError> {
        let body = fields.to_bytes()?;
        self.send(path, &body).await
    }

    /// POST without a bearer header; only the credential exchange uses this.
    pub(crate) async fn send_anonymous(&self, path: &str, fields: &Fields) -> Result<Value, ApiError> {
        let body = fields.to_bytes()?;
        self.post(path, body, None).await
    }

    async fn post(&self, path: &str, body: Vec<u8>, bearer: Option<&str>) -> Result<Value, ApiError> {
        let url = self.url(path);
        debug!(%url, bytes = body.len(), "POST");
        let mut req = self
            .http
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body);
        if let Some(token) = bearer {
            req = req.bearer_auth(token);
        }
        let request_err = |source| ApiError::Request {
            path: path.to_string(),
            source,
        };
        let resp = req.send().await.map_err(request_err)?;
        let status = resp.status().as_u16();
        let bytes = resp.bytes().await.map_err(request_err)?;
        if !is_success(status) {
            return Err(ApiError::Status {
                path: path.to_string(),
                status,
                body: truncate(&String::from_utf8_lossy(&bytes), MAX_ERROR_BODY),
            });
        }
        parse_body(path, &bytes)
    }
}

// An empty body (e.g. 204) is `null`.
fn parse_body(path: &str, bytes: &[u8]) -> Result<Value, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes).map_err(|source| ApiError::Decode {
        path: path.to_string(),
        source,
    })
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max).collect();
    out.push_str("...");
    out
}
