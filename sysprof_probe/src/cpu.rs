//! CPU probe: per-core usage and the process table.

use crate::types::{CpuUsage, MemInfo, ProcessInfo};
use crate::{Probe, Reading};
use anyhow::bail;
use chrono::{DateTime, Utc};
use std::time::Duration;
use sysinfo::{
    CpuRefreshKind, Process, ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System, Users,
    MINIMUM_CPU_UPDATE_INTERVAL,
};

pub struct CpuProbe {
    sys: System,
    users: Users,
    interval: Duration,
}

impl CpuProbe {
    pub fn new(interval: Duration) -> Self {
        let refresh_kind = RefreshKind::nothing()
            .with_cpu(CpuRefreshKind::everything())
            .with_processes(ProcessRefreshKind::everything());
        Self {
            sys: System::new_with_specifics(refresh_kind),
            users: Users::new_with_refreshed_list(),
            interval,
        }
    }

    // Usage figures are deltas between two refreshes, so take a baseline and
    // wait out the sampling window before reading anything.
    fn sample(&mut self) {
        self.sys.refresh_cpu_usage();
        self.sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_cpu(),
        );
        std::thread::sleep(self.interval.max(MINIMUM_CPU_UPDATE_INTERVAL));
        self.sys.refresh_cpu_usage();
        self.sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::everything(),
        );
    }

    fn cpu_data(&self) -> anyhow::Result<CpuUsage> {
        let cpus = self.sys.cpus();
        if cpus.is_empty() {
            bail!("no cpus reported");
        }
        Ok(core_usage(cpus.iter().map(|c| c.cpu_usage())))
    }

    fn processes(&self) -> anyhow::Result<Vec<ProcessInfo>> {
        let procs = self.sys.processes();
        if procs.is_empty() {
            bail!("process table is empty");
        }
        let mut list: Vec<ProcessInfo> = procs.values().map(|p| self.process_info(p)).collect();
        list.sort_by_key(|p| p.pid);
        Ok(list)
    }

    fn process_info(&self, p: &Process) -> ProcessInfo {
        let user = p
            .user_id()
            .and_then(|uid| self.users.get_user_by_id(uid))
            .map(|u| u.name().to_string());
        let mut info = ProcessInfo {
            name: p.name().to_string_lossy().into_owned(),
            pid: p.pid().as_u32(),
            user,
            status: p.status().to_string(),
            create_time: start_time(p.start_time()),
            cli: None,
            executable: None,
            cpu_percent: None,
            mem_info: None,
            threads: None,
        };
        // Processes we may not inspect (other users, kernel threads) expose
        // neither argv nor exe; report only the basic fields for those.
        if p.exe().is_none() && p.cmd().is_empty() {
            return info;
        }
        info.cli = Some(
            p.cmd()
                .iter()
                .map(|a| a.to_string_lossy().into_owned())
                .collect(),
        );
        info.executable = p.exe().map(|e| e.display().to_string());
        info.cpu_percent = Some(p.cpu_usage());
        info.mem_info = Some(MemInfo {
            rss: p.memory(),
            vms: p.virtual_memory(),
        });
        info.threads = p.tasks().map(|t| t.len());
        info
    }
}

impl Probe for CpuProbe {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn read(&mut self) -> Vec<Reading> {
        self.sample();
        vec![
            Reading::capture("cpu_data", self.cpu_data()),
            Reading::capture("process_data", self.processes()),
        ]
    }
}

/// Label per-core usage as `CPU_1..CPU_n`.
pub fn core_usage<I: IntoIterator<Item = f32>>(usage: I) -> CpuUsage {
    usage
        .into_iter()
        .enumerate()
        .map(|(i, u)| (format!("CPU_{}", i + 1), u))
        .collect()
}

fn start_time(secs: u64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs as i64, 0).unwrap_or_default()
}
