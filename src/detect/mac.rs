use super::DeviceDetectionStrategy;
use crate::constants::UNKNOWN;
use crate::db::oui::{normalize_mac, MacVendorDatabase};
use crate::errors::NetworkDiscoveryError;
use crate::model::HostRecord;
use crate::net::command::CommandRunner;
use crate::net::platform::{NeighborFormat, Platform};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

static LLADDR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"lladdr\s+([0-9a-fA-F]{1,2}(?::[0-9a-fA-F]{1,2}){5})\b").expect("lladdr pattern is valid")
});

static MAC_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[0-9a-fA-F]{1,2}(?:[:-][0-9a-fA-F]{1,2}){5}\b").expect("MAC pattern is valid")
});

/// Link-layer address from the neighbor table, plus its vendor
pub struct MacAddressStrategy {
    runner: Arc<dyn CommandRunner>,
    platform: Platform,
    vendor_db: Arc<MacVendorDatabase>,
    wait: Duration,
}

impl MacAddressStrategy {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        platform: Platform,
        vendor_db: Arc<MacVendorDatabase>,
        wait: Duration,
    ) -> Self {
        Self {
            runner,
            platform,
            vendor_db,
            wait,
        }
    }

    /// Prime the neighbor cache, then ask each neighbor query in turn
    pub async fn resolve_mac(&self, addr: Ipv4Addr) -> Option<String> {
        let prime = self.platform.echo_command(addr, self.wait);
        if let Err(e) = self.runner.run(&prime).await {
            debug!("neighbor cache priming for {} failed: {}", addr, e);
        }

        for query in self.platform.neighbor_queries(addr) {
            match self.runner.run(&query.command).await {
                Ok(output) => {
                    if let Some(mac) = parse_neighbor_output(query.format, &output.stdout, addr) {
                        return Some(mac);
                    }
                    debug!("`{}` had no entry for {}", query.command.command_line(), addr);
                }
                Err(e) => debug!("neighbor query for {} failed: {}", addr, e),
            }
        }
        None
    }
}

/// Extract and normalize the MAC belonging to `addr` from a neighbor query
pub fn parse_neighbor_output(format: NeighborFormat, output: &str, addr: Ipv4Addr) -> Option<String> {
    let raw = match format {
        NeighborFormat::IpNeigh => LLADDR
            .captures(output)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str()),
        NeighborFormat::ArpTable => MAC_TOKEN.find(output).map(|m| m.as_str()),
        NeighborFormat::WindowsArp => {
            let addr = addr.to_string();
            output
                .lines()
                .find(|line| line.split_whitespace().next() == Some(addr.as_str()))
                .and_then(|line| MAC_TOKEN.find(line))
                .map(|m| m.as_str())
        }
    }?;

    normalize_mac(raw).filter(|mac| is_station_address(mac))
}

/// Rejects the all-zero placeholder of incomplete entries and the broadcast address
fn is_station_address(mac: &str) -> bool {
    mac != "00:00:00:00:00:00" && mac != "FF:FF:FF:FF:FF:FF"
}

#[async_trait]
impl DeviceDetectionStrategy for MacAddressStrategy {
    fn name(&self) -> &'static str {
        "neighbor table MAC lookup with OUI vendor"
    }

    async fn detect(&self, host: &mut HostRecord) -> Result<(), NetworkDiscoveryError> {
        match self.resolve_mac(host.address).await {
            Some(mac) => {
                host.vendor = self.vendor_db.vendor_or_unknown(&mac);
                host.mac_address = mac;
            }
            None => {
                host.mac_address = UNKNOWN.to_string();
                host.vendor = UNKNOWN.to_string();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 1);

    #[test]
    fn ip_neigh_lladdr() {
        let out = "192.168.1.1 dev wlan0 lladdr a4:5e:60:12:34:56 REACHABLE\n";
        assert_eq!(
            parse_neighbor_output(NeighborFormat::IpNeigh, out, ADDR).as_deref(),
            Some("A4:5E:60:12:34:56")
        );
    }

    #[test]
    fn ip_neigh_failed_entry() {
        let out = "192.168.1.1 dev wlan0  FAILED\n";
        assert_eq!(parse_neighbor_output(NeighborFormat::IpNeigh, out, ADDR), None);
    }

    #[test]
    fn linux_arp_table() {
        let out = "Address                  HWtype  HWaddress           Flags Mask            Iface\n\
                   192.168.1.1              ether   b8:27:eb:aa:bb:cc   C                     eth0\n";
        assert_eq!(
            parse_neighbor_output(NeighborFormat::ArpTable, out, ADDR).as_deref(),
            Some("B8:27:EB:AA:BB:CC")
        );
    }

    #[test]
    fn bsd_arp_short_octets() {
        let out = "? (192.168.1.1) at 0:1b:63:a:bb:cc on en0 ifscope [ethernet]\n";
        assert_eq!(
            parse_neighbor_output(NeighborFormat::ArpTable, out, ADDR).as_deref(),
            Some("00:1B:63:0A:BB:CC")
        );
    }

    #[test]
    fn arp_incomplete_entry() {
        let out = "? (192.168.1.1) at (incomplete) on en0 ifscope [ethernet]\n";
        assert_eq!(parse_neighbor_output(NeighborFormat::ArpTable, out, ADDR), None);
    }

    #[test]
    fn windows_arp_matches_whole_address_only() {
        let out = "Interface: 192.168.1.50 --- 0xb\n\
                   \x20 Internet Address      Physical Address      Type\n\
                   \x20 192.168.1.10          11-22-33-44-55-66     dynamic\n\
                   \x20 192.168.1.1           00-1a-11-aa-bb-cc     dynamic\n\
                   \x20 192.168.1.255         ff-ff-ff-ff-ff-ff     static\n";
        assert_eq!(
            parse_neighbor_output(NeighborFormat::WindowsArp, out, ADDR).as_deref(),
            Some("00:1A:11:AA:BB:CC")
        );
        assert_eq!(
            parse_neighbor_output(NeighborFormat::WindowsArp, out, Ipv4Addr::new(192, 168, 1, 255)),
            None
        );
    }
}
