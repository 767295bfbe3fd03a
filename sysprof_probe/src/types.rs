//! Snapshot types produced by the probes.
//! Keep this module minimal and stable: it defines the wire format of every domain payload.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::util::Elapsed;

/// Per-core usage percent keyed `CPU_1..CPU_n`.
pub type CpuUsage = BTreeMap<String, f32>;

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct MemInfo {
    pub rss: u64,
    pub vms: u64,
}

#[derive(Debug, Serialize, Clone)]
pub struct ProcessInfo {
    pub name: String,
    pub pid: u32,
    pub user: Option<String>,
    pub status: String,
    pub create_time: DateTime<Utc>,
    // detail fields are omitted when the process could not be fully inspected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cli: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executable: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_percent: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mem_info: Option<MemInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
}

#[derive(Debug, Serialize, Clone)]
pub struct DiskInfo {
    pub mount_point: String,
    pub file_system: String,
    pub total: String,
    pub used: String,
    pub free: String,
    pub percent: f64,
}

#[derive(Debug, Serialize, Clone)]
pub struct MemorySnapshot {
    pub total_memory: String,
    pub available_memory: String,
    pub percent: f64,
    pub used: String,
    pub free: String,
    pub swap_total: String,
    pub swap_used: String,
    pub swap_free: String,
}

/// Counters aggregated over every interface since boot.
#[derive(Debug, Serialize, Clone)]
pub struct NetworkTotals {
    pub bytes_sent: String,
    pub bytes_recvd: String,
    pub packets_sent: u64,
    pub packets_recvd: u64,
    pub err_pkt_in: u64,
    pub err_pkt_out: u64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct InterfaceAddress {
    pub interface: String,
    pub address: String,
    pub prefix: u8,
}

#[derive(Debug, Serialize, Clone, Default)]
pub struct InterfaceAddresses {
    pub interfaces: Vec<InterfaceAddress>,
}

#[derive(Debug, Serialize, Clone)]
pub struct OsIdentity {
    pub name: String,
    pub version: Option<String>,
    pub long_version: Option<String>,
    pub kernel: Option<String>,
    pub arch: String,
    pub platform: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct LoginSession {
    pub user_name: String,
    pub terminal: String,
    pub host: Option<String>,
    pub started: Option<DateTime<Local>>,
}

/// Time since boot; serialized as a `H:MM:SS` style string.
pub type Uptime = Elapsed;
