//! Network probe: aggregate I/O counters and IPv4 interface addresses.

use crate::types::{InterfaceAddress, InterfaceAddresses, NetworkTotals};
use crate::util::format_size;
use crate::{Probe, Reading};
use anyhow::bail;
use std::net::IpAddr;
use sysinfo::Networks;

pub struct NetworkProbe {
    nets: Networks,
}

impl NetworkProbe {
    pub fn new() -> Self {
        Self {
            nets: Networks::new(),
        }
    }

    fn net_data(&self) -> anyhow::Result<NetworkTotals> {
        if self.nets.is_empty() {
            bail!("no network interfaces reported");
        }
        let (mut rx, mut tx, mut prx, mut ptx, mut erx, mut etx) = (0u64, 0u64, 0u64, 0u64, 0u64, 0u64);
        for data in self.nets.values() {
            rx = rx.saturating_add(data.total_received());
            tx = tx.saturating_add(data.total_transmitted());
            prx = prx.saturating_add(data.total_packets_received());
            ptx = ptx.saturating_add(data.total_packets_transmitted());
            erx = erx.saturating_add(data.total_errors_on_received());
            etx = etx.saturating_add(data.total_errors_on_transmitted());
        }
        Ok(NetworkTotals {
            bytes_sent: format_size(tx),
            bytes_recvd: format_size(rx),
            packets_sent: ptx,
            packets_recvd: prx,
            err_pkt_in: erx,
            err_pkt_out: etx,
        })
    }

    fn ip_address(&self) -> anyhow::Result<InterfaceAddresses> {
        if self.nets.is_empty() {
            bail!("no network interfaces reported");
        }
        let all = self.nets.iter().flat_map(|(name, data)| {
            data.ip_networks()
                .iter()
                .map(move |n| (name.clone(), n.addr, n.prefix))
        });
        Ok(ipv4_only(all))
    }
}

impl Default for NetworkProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl Probe for NetworkProbe {
    fn name(&self) -> &'static str {
        "network"
    }

    fn read(&mut self) -> Vec<Reading> {
        self.nets.refresh(true);
        vec![
            Reading::capture("network_data", self.net_data()),
            Reading::capture("ips", self.ip_address()),
        ]
    }
}

/// Keep IPv4 addresses only, ordered by interface then address.
pub fn ipv4_only<I>(addrs: I) -> InterfaceAddresses
where
    I: IntoIterator<Item = (String, IpAddr, u8)>,
{
    let mut interfaces: Vec<InterfaceAddress> = addrs
        .into_iter()
        .filter(|(_, addr, _)| addr.is_ipv4())
        .map(|(interface, addr, prefix)| InterfaceAddress {
            interface,
            address: addr.to_string(),
            prefix,
        })
        .collect();
    interfaces.sort_by(|a, b| {
        a.interface
            .cmp(&b.interface)
            .then_with(|| a.address.cmp(&b.address))
    });
    InterfaceAddresses { interfaces }
}
