//! Report session lifecycle.
//!
//! A run moves through three states, each a distinct type:
//!
//! ```text
//! Session --authenticate--> AuthenticatedSession --register_report--> ReportSession
//! ```
//!
//! Only [`ReportSession`] can submit, so nothing is ever sent before a
//! report identifier exists, and the identifier cannot change once bound.

use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use tracing::{info, warn};

use crate::client::{ApiClient, AUTHENTICATE_PATH};
use crate::error::{ApiError, SessionError};
use crate::payload::{envelope, Fields, REPORT_ID, TARGET};

/// Long-lived identity used once to obtain tokens.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    /// Held for the session; no refresh flow uses it yet.
    pub refresh_token: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenPair { <redacted> }")
    }
}

/// Extract both tokens from an authentication response; `None` if either is
/// missing or empty.
pub fn parse_tokens(body: &Value) -> Option<TokenPair> {
    TokenPair::deserialize(body)
        .ok()
        .filter(|t| !t.access_token.is_empty() && !t.refresh_token.is_empty())
}

/// Extract `report_id` from a registration response. Numeric ids are
/// accepted and rendered in decimal.
pub fn parse_report_id(body: &Value) -> Option<String> {
    match body.get(REPORT_ID)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Not yet authenticated.
#[derive(Debug)]
pub struct Session {
    client: ApiClient,
}

impl Session {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Exchange credentials for a token pair.
    pub async fn authenticate(
        self,
        credentials: &Credentials,
    ) -> Result<AuthenticatedSession, SessionError> {
        let mut body = Fields::new();
        body.insert_value("email", Value::String(credentials.email.clone()));
        body.insert_value("password", Value::String(credentials.password.clone()));

        let resp = self
            .client
            .send_anonymous(AUTHENTICATE_PATH, &body)
            .await
            .map_err(|e| SessionError::Authentication(e.to_string()))?;
        let tokens = parse_tokens(&resp).ok_or_else(|| {
            SessionError::Authentication("response lacks access_token/refresh_token".into())
        })?;
        info!("authenticated");
        Ok(AuthenticatedSession {
            client: self.client.with_access_token(tokens.access_token.clone()),
            tokens,
        })
    }
}

/// Holds a token pair; may register a report.
#[derive(Debug)]
pub struct AuthenticatedSession {
    client: ApiClient,
    tokens: TokenPair,
}

impl AuthenticatedSession {
    pub fn tokens(&self) -> &TokenPair {
        &self.tokens
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Open a report for `target`, binding the server-issued report id.
    pub async fn register_report(
        self,
        target: &str,
        path: &str,
    ) -> Result<ReportSession, SessionError> {
        if target.is_empty() {
            return Err(SessionError::Registration("target is empty".into()));
        }
        let mut body = Fields::new();
        body.insert_value(TARGET, Value::String(target.to_string()));

        let resp = self
            .client
            .send_fields(path, &body)
            .await
            .map_err(|e| SessionError::Registration(e.to_string()))?;
        let Some(report_id) = parse_report_id(&resp) else {
            warn!(%path, "registration response has no report_id");
            return Err(SessionError::Registration(format!(
                "{path} response lacks report_id"
            )));
        };
        info!(%report_id, %target, "report registered");
        Ok(ReportSession {
            client: self.client,
            tokens: self.tokens,
            target: target.to_string(),
            report_id,
        })
    }
}

/// A registered report: the only state that can submit metrics.
#[derive(Debug)]
pub struct ReportSession {
    client: ApiClient,
    tokens: TokenPair,
    target: String,
    report_id: String,
}

impl ReportSession {
    pub fn report_id(&self) -> &str {
        &self.report_id
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn tokens(&self) -> &TokenPair {
        &self.tokens
    }

    /// Submit one domain payload to `path`, tagged with this report's target and id.
    pub async fn submit(&self, fields: Fields, path: &str) -> Result<Value, ApiError> {
        let env = envelope(fields, &self.target, Some(&self.report_id));
        self.client.send_fields(path, &env).await
    }
}
