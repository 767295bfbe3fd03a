//! Disk probe: usage of mounted filesystems.

use crate::types::DiskInfo;
use crate::util::{format_size, percent};
use crate::{Probe, Reading};
use anyhow::bail;
use once_cell::sync::OnceCell;
use std::path::Path;
use sysinfo::Disks;

/// `SYSPROF_ALL_DISKS=1` reports every mount instead of only the system root (read once).
pub fn all_disks_enabled() -> bool {
    static ON: OnceCell<bool> = OnceCell::new();
    *ON.get_or_init(|| {
        std::env::var("SYSPROF_ALL_DISKS")
            .map(|v| v != "0")
            .unwrap_or(false)
    })
}

pub struct DiskProbe {
    disks: Disks,
    all_mounts: bool,
}

impl DiskProbe {
    pub fn new(all_mounts: bool) -> Self {
        Self {
            disks: Disks::new(),
            all_mounts,
        }
    }

    fn partitions(&mut self) -> anyhow::Result<Vec<DiskInfo>> {
        self.disks.refresh(true);
        if self.disks.list().is_empty() {
            bail!("no mounted filesystems reported");
        }
        let disks = self
            .disks
            .iter()
            .filter(|d| self.all_mounts || is_system_root(d.mount_point()))
            .map(|d| {
                let total = d.total_space();
                let free = d.available_space();
                let used = total.saturating_sub(free);
                DiskInfo {
                    mount_point: d.mount_point().display().to_string(),
                    file_system: d.file_system().to_string_lossy().into_owned(),
                    total: format_size(total),
                    used: format_size(used),
                    free: format_size(free),
                    percent: percent(used, total),
                }
            })
            .collect();
        Ok(disks)
    }
}

impl Probe for DiskProbe {
    fn name(&self) -> &'static str {
        "disk"
    }

    fn read(&mut self) -> Vec<Reading> {
        vec![Reading::capture("disk_data", self.partitions())]
    }
}

/// `/` on unix-likes, the `C:` drive on Windows.
pub fn is_system_root(mount: &Path) -> bool {
    let s = mount.to_string_lossy();
    s == "/" || s.eq_ignore_ascii_case("C:") || s.eq_ignore_ascii_case("C:\\")
}
