//! lanwatch - periodic local network discovery
//!
//! Given a subnet, this library determines which hosts are alive and
//! resolves, for each of them:
//! - round-trip latency from a single ICMP echo
//! - a hostname, trying reverse DNS, NetBIOS and the echo banner in turn
//! - the MAC address from the neighbor table and its OUI vendor
//! - which of the configured TCP ports accept a connection
//!
//! Probing is done by running the operating system's own network
//! utilities; no packets are crafted here.

pub mod alert;
pub mod config;
pub mod constants;
pub mod db;
pub mod detect;
pub mod engine;
pub mod errors;
pub mod model;
pub mod net;
pub mod report;
pub mod schedule;
pub mod table;

// Re-export commonly used types for convenience
pub use config::ScanConfig;
pub use db::oui::MacVendorDatabase;
pub use detect::hostname::HostnameStrategy;
pub use detect::mac::MacAddressStrategy;
pub use detect::port::PortScanStrategy;
pub use detect::DeviceDetectionStrategy;
pub use engine::{NetworkDiscovery, ScanRun};
pub use errors::NetworkDiscoveryError;
pub use model::{HostRecord, HostStatus, ResultSet};
