//! One reporting pass: read every probe and submit each reading under the run's report.

use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{info, warn};

use sysprof_probe::{Probe, Reading};

use crate::error::ApiError;
use crate::payload::{envelope, Fields};
use crate::session::ReportSession;

pub const DEFAULT_REGISTER_PATH: &str = "/api/report/new";

/// Field name -> API path for every reading the standard probes produce.
pub const DEFAULT_ROUTES: [(&str, &str); 9] = [
    ("cpu_data", "/api/cpu/info"),
    ("process_data", "/api/cpu/processes"),
    ("disk_data", "/api/disk/info"),
    ("mem_data", "/api/memory/info"),
    ("network_data", "/api/network/info"),
    ("ips", "/api/network/ip"),
    ("os", "/api/system/os"),
    ("uptime", "/api/system/uptime"),
    ("users", "/api/system/users"),
];

/// Where each reading is submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routes(BTreeMap<String, String>);

impl Default for Routes {
    fn default() -> Self {
        Self(
            DEFAULT_ROUTES
                .iter()
                .map(|(f, p)| (f.to_string(), p.to_string()))
                .collect(),
        )
    }
}

impl Routes {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn set(&mut self, field: impl Into<String>, path: impl Into<String>) {
        self.0.insert(field.into(), path.into());
    }

    pub fn path(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Result of a single submission.
#[derive(Debug)]
pub struct SubmissionOutcome {
    pub field: &'static str,
    pub path: String,
    /// The probe could not read this domain; the envelope went out with `null`.
    pub snapshot_missing: bool,
    pub result: Result<Value, ApiError>,
}

impl SubmissionOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<SubmissionOutcome>,
    /// Readings with no configured route.
    pub skipped: Vec<&'static str>,
}

impl RunSummary {
    pub fn submitted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_ok()).count()
    }

    pub fn outcome(&self, field: &str) -> Option<&SubmissionOutcome> {
        self.outcomes.iter().find(|o| o.field == field)
    }
}

/// Domain payload for a reading: `{<field>: snapshot}`, or `{<field>: null}` when the probe failed.
pub fn reading_fields(reading: &Reading) -> Fields {
    let mut fields = Fields::new();
    fields.insert_value(reading.field, reading.value.clone().unwrap_or(Value::Null));
    fields
}

/// Drives the probes against a registered report.
pub struct Reporter<'a> {
    session: &'a ReportSession,
    routes: &'a Routes,
}

impl<'a> Reporter<'a> {
    pub fn new(session: &'a ReportSession, routes: &'a Routes) -> Self {
        Self { session, routes }
    }

    /// Read each probe in turn and submit every reading. Failures are
    /// recorded and logged; they never stop the remaining submissions.
    ///
    /// Probe reads block (CPU sampling window, spawning `who`), so each one
    /// runs on the blocking pool.
    pub async fn run(&self, probes: Vec<Box<dyn Probe>>) -> RunSummary {
        let mut summary = RunSummary::default();
        for mut probe in probes {
            let name = probe.name();
            let readings = match tokio::task::spawn_blocking(move || probe.read()).await {
                Ok(r) => r,
                Err(e) => {
                    warn!(probe = name, error = %e, "probe task aborted");
                    continue;
                }
            };
            for reading in readings {
                let Some(path) = self.routes.path(reading.field) else {
                    warn!(probe = name, field = reading.field, "no route configured, skipping");
                    summary.skipped.push(reading.field);
                    continue;
                };
                let outcome = self.submit(&reading, path).await;
                summary.outcomes.push(outcome);
            }
        }
        summary
    }

    async fn submit(&self, reading: &Reading, path: &str) -> SubmissionOutcome {
        let snapshot_missing = reading.value.is_none();
        if snapshot_missing {
            warn!(field = reading.field, "snapshot unavailable, submitting null");
        }
        let result = self.session.submit(reading_fields(reading), path).await;
        match &result {
            Ok(_) => info!(field = reading.field, %path, "submitted"),
            Err(e) => warn!(field = reading.field, %path, error = %e, "submission failed"),
        }
        SubmissionOutcome {
            field: reading.field,
            path: path.to_string(),
            snapshot_missing,
            result,
        }
    }
}

/// Envelopes a run would send, without a report id; used by `--dry-run`.
pub async fn preview(probes: Vec<Box<dyn Probe>>, target: &str) -> Vec<Fields> {
    let mut out = Vec::new();
    for mut probe in probes {
        let name = probe.name();
        match tokio::task::spawn_blocking(move || probe.read()).await {
            Ok(readings) => out.extend(
                readings
                    .iter()
                    .map(|r| envelope(reading_fields(r), target, None)),
            ),
            Err(e) => warn!(probe = name, error = %e, "probe task aborted"),
        }
    }
    out
}
