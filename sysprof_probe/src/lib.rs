//! Host metric probes for sysprof.
//!
//! Each [`Probe`] reads one metric domain (CPU, disk, memory, network,
//! system) from OS facilities via `sysinfo` and yields one or more
//! [`Reading`]s. A reading whose query failed carries no value; the failure
//! is logged here and never escalated, so one broken domain cannot stop the
//! others from being reported.

pub mod cpu;
pub mod disk;
pub mod memory;
pub mod network;
pub mod system;
pub mod types;
pub mod util;

use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

pub use util::{format_size, Elapsed};

/// One named snapshot produced by a probe; becomes exactly one submission.
#[derive(Debug, Clone)]
pub struct Reading {
    /// Field name the snapshot is submitted under (e.g. `"cpu_data"`).
    pub field: &'static str,
    /// `None` when the underlying OS query failed.
    pub value: Option<Value>,
}

impl Reading {
    pub fn new(field: &'static str, value: Option<Value>) -> Self {
        Self { field, value }
    }

    /// Turn a probe result into a reading, logging and discarding the error.
    pub fn capture<T: Serialize>(field: &'static str, res: anyhow::Result<T>) -> Self {
        let value = match res.and_then(|v| Ok(serde_json::to_value(v)?)) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(field, error = %e, "probe read failed");
                None
            }
        };
        Self { field, value }
    }
}

/// A read-only source of one metric domain.
pub trait Probe: Send {
    /// Domain name used for logging (e.g. `"cpu"`).
    fn name(&self) -> &'static str;

    /// Take a snapshot. Never fails as a whole: every reading it is
    /// responsible for is returned, with `value: None` for the ones that
    /// could not be collected.
    fn read(&mut self) -> Vec<Reading>;
}

/// Knobs for the default probe set.
#[derive(Debug, Clone)]
pub struct ProbeOptions {
    /// Window over which per-core CPU usage is measured.
    pub cpu_interval: Duration,
    /// Report every mounted filesystem instead of only the root.
    pub all_disks: bool,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            cpu_interval: Duration::from_secs(1),
            all_disks: disk::all_disks_enabled(),
        }
    }
}

/// The five standard probes, in reporting order.
pub fn default_probes(opts: &ProbeOptions) -> Vec<Box<dyn Probe>> {
    vec![
        Box::new(cpu::CpuProbe::new(opts.cpu_interval)),
        Box::new(disk::DiskProbe::new(opts.all_disks)),
        Box::new(memory::MemoryProbe::new()),
        Box::new(network::NetworkProbe::new()),
        Box::new(system::SystemProbe::new()),
    ]
}

/// Machine hostname, used as the default report target.
pub fn hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|s| s.into_string().ok())
        .filter(|s| !s.is_empty())
        .or_else(sysinfo::System::host_name)
        .unwrap_or_else(|| "unknown".into())
}
