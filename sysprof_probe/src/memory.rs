//! Memory probe.

use crate::types::MemorySnapshot;
use crate::util::{format_size, percent};
use crate::{Probe, Reading};
use anyhow::bail;
use sysinfo::{MemoryRefreshKind, RefreshKind, System};

pub struct MemoryProbe {
    sys: System,
}

impl MemoryProbe {
    pub fn new() -> Self {
        let kind = RefreshKind::nothing().with_memory(MemoryRefreshKind::everything());
        Self {
            sys: System::new_with_specifics(kind),
        }
    }

    fn mem_data(&mut self) -> anyhow::Result<MemorySnapshot> {
        self.sys.refresh_memory();
        let total = self.sys.total_memory();
        if total == 0 {
            bail!("total memory reported as zero");
        }
        let available = self.sys.available_memory();
        // used = total - available, matching what top/free report as pressure
        let used = total.saturating_sub(available);
        Ok(MemorySnapshot {
            total_memory: format_size(total),
            available_memory: format_size(available),
            percent: percent(used, total),
            used: format_size(used),
            free: format_size(self.sys.free_memory()),
            swap_total: format_size(self.sys.total_swap()),
            swap_used: format_size(self.sys.used_swap()),
            swap_free: format_size(self.sys.free_swap()),
        })
    }
}

impl Default for MemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl Probe for MemoryProbe {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn read(&mut self) -> Vec<Reading> {
        vec![Reading::capture("mem_data", self.mem_data())]
    }
}
