//! Error types shared by the transport client and the report session.

/// Building a request payload failed; the send is never attempted.
#[derive(Debug, thiserror::Error)]
#[error("payload field '{field}' could not be serialized: {source}")]
pub struct PayloadError {
    pub field: String,
    #[source]
    pub source: serde_json::Error,
}

/// Failure of a single HTTP exchange with the collection API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request path is empty")]
    EmptyPath,

    #[error("request payload is empty")]
    EmptyPayload,

    /// No access token: protected paths are never contacted.
    #[error("no access token; refusing to call {path}")]
    MissingToken { path: String },

    #[error(transparent)]
    Payload(#[from] PayloadError),

    /// Connection refused, timeout, TLS failure and similar.
    #[error("request to {path} failed: {source}")]
    Request {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a status outside 200/201/202/204.
    #[error("{path} returned HTTP {status}: {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },

    #[error("{path} returned an unparseable body: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// HTTP status of the response, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the request never left the process.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ApiError::EmptyPath
                | ApiError::EmptyPayload
                | ApiError::MissingToken { .. }
                | ApiError::Payload(_)
        )
    }
}

/// Failures that end the run: no report can be produced after these.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("report registration failed: {0}")]
    Registration(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: String, reason: String },
}
