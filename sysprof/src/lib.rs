//! sysprof: authenticate against a collection API, open a report for this
//! host, and submit one payload per metric domain under that report.

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod payload;
pub mod report;
pub mod session;

pub use client::ApiClient;
pub use error::{ApiError, ConfigError, PayloadError, SessionError};
pub use payload::Fields;
pub use report::{Reporter, Routes, RunSummary};
pub use session::{AuthenticatedSession, Credentials, ReportSession, Session, TokenPair};
