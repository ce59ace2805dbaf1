use crate::constants::{DEFAULT_OUI_FILE, DEFAULT_PORTS, HIGH_LATENCY_MS};
use crate::errors::NetworkDiscoveryError;
use crate::report::ReportFormat;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration settings for one scan
///
/// Immutable for the duration of a scan. Every field has a default, so a
/// config file only needs to name what it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Target subnet in CIDR form or a single address; `None` autodetects
    /// the local network
    #[serde(alias = "ip_range")]
    pub subnet: Option<String>,

    /// Ports probed on every host, in probe order
    #[serde(alias = "ports_to_check")]
    pub ports: Vec<u16>,

    /// Path to the plain-text OUI vendor table
    pub oui_path: PathBuf,

    /// Timeout handed to the echo utility
    pub ping_timeout_ms: u64,

    /// Timeout in milliseconds for TCP connection attempts
    pub tcp_connect_timeout_ms: u64,

    /// Upper bound for any external utility invocation
    pub command_timeout_ms: u64,

    /// Maximum number of hosts probed at the same time
    pub max_concurrent_scans: usize,

    /// Latency above which a reachable host is reported as an alert
    #[serde(alias = "latency_threshold")]
    pub latency_threshold_ms: f64,

    /// Minutes between scan cycles; `None` scans once and exits
    pub scan_interval_minutes: Option<u64>,

    pub report_format: ReportFormat,
    pub report_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            subnet: None,
            ports: DEFAULT_PORTS.to_vec(),
            oui_path: PathBuf::from(DEFAULT_OUI_FILE),
            ping_timeout_ms: 1000,
            tcp_connect_timeout_ms: 500,
            command_timeout_ms: 3000,
            max_concurrent_scans: 64,
            latency_threshold_ms: HIGH_LATENCY_MS,
            scan_interval_minutes: None,
            report_format: ReportFormat::Table,
            report_dir: PathBuf::from("reports"),
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl ScanConfig {
    /// Load a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, NetworkDiscoveryError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, NetworkDiscoveryError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout_ms)
    }

    pub fn tcp_connect_timeout(&self) -> Duration {
        Duration::from_millis(self.tcp_connect_timeout_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    /// Pause between scan cycles, at least one minute; `None` for a single scan
    pub fn scan_interval(&self) -> Option<Duration> {
        self.scan_interval_minutes
            .map(|minutes| Duration::from_secs(minutes.max(1) * 60))
    }

    /// Worker ceiling, never below one
    pub fn concurrency(&self) -> usize {
        self.max_concurrent_scans.max(1)
    }

    /// Apply command-line overrides on top of file values
    ///
    /// The target precedence is `range`, then `ip` (as a /32), then
    /// `self_scan` (autodetect).
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(range) = &overrides.range {
            self.subnet = Some(range.clone());
        } else if let Some(ip) = overrides.ip {
            self.subnet = Some(format!("{}/32", ip));
        } else if overrides.self_scan {
            self.subnet = None;
        }
        if let Some(format) = overrides.format {
            self.report_format = format;
        }
        if let Some(jobs) = overrides.jobs {
            self.max_concurrent_scans = jobs.max(1);
        }
        if let Some(minutes) = overrides.interval {
            self.scan_interval_minutes = Some(minutes);
        }
    }
}

/// Values supplied on the command line that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub range: Option<String>,
    pub ip: Option<Ipv4Addr>,
    pub self_scan: bool,
    pub format: Option<ReportFormat>,
    pub jobs: Option<usize>,
    pub interval: Option<u64>,
}
