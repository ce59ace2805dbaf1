use crate::constants::UNKNOWN;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::net::Ipv4Addr;

/// Scan-time liveness classification of one address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostStatus {
    Reachable,
    Unreachable,
}

impl fmt::Display for HostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostStatus::Reachable => f.write_str("Reachable"),
            HostStatus::Unreachable => f.write_str("Unreachable"),
        }
    }
}

/// Everything learned about one candidate address during a scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostRecord {
    #[serde(rename = "ip")]
    pub address: Ipv4Addr,
    pub status: HostStatus,
    #[serde(rename = "latency")]
    pub latency_ms: Option<f64>,
    pub hostname: String,
    #[serde(rename = "mac")]
    pub mac_address: String,
    pub vendor: String,
    pub open_ports: Vec<u16>,
}

impl HostRecord {
    /// A record with nothing resolved yet
    pub fn new(address: Ipv4Addr) -> Self {
        Self {
            address,
            status: HostStatus::Unreachable,
            latency_ms: None,
            hostname: UNKNOWN.to_string(),
            mac_address: UNKNOWN.to_string(),
            vendor: UNKNOWN.to_string(),
            open_ports: Vec::new(),
        }
    }

    pub fn is_reachable(&self) -> bool {
        self.status == HostStatus::Reachable
    }

    /// No hostname, no MAC and no echo reply: most likely nothing lives at
    /// this address.
    pub fn is_phantom(&self) -> bool {
        self.status == HostStatus::Unreachable
            && self.hostname == UNKNOWN
            && self.mac_address == UNKNOWN
    }
}

/// Records collected during one scan, one per address
///
/// Append-only while workers run. Ordering follows insertion, i.e. worker
/// completion order, not address order.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    records: Vec<HostRecord>,
    seen: HashSet<Ipv4Addr>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record; returns false and drops it if its address is
    /// already present.
    pub fn insert(&mut self, record: HostRecord) -> bool {
        if !self.seen.insert(record.address) {
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, address: Ipv4Addr) -> bool {
        self.seen.contains(&address)
    }

    pub fn get(&self, address: Ipv4Addr) -> Option<&HostRecord> {
        self.records.iter().find(|r| r.address == address)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HostRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[HostRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<HostRecord> {
        self.records
    }
}

impl IntoIterator for ResultSet {
    type Item = HostRecord;
    type IntoIter = std::vec::IntoIter<HostRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a HostRecord;
    type IntoIter = std::slice::Iter<'a, HostRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
