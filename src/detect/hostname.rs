use super::DeviceDetectionStrategy;
use crate::constants::{NETBIOS_UNIQUE, NETBIOS_WORKSTATION, UNKNOWN};
use crate::errors::NetworkDiscoveryError;
use crate::model::HostRecord;
use crate::net::command::CommandRunner;
use crate::net::platform::Platform;
use async_trait::async_trait;
use dns_lookup::lookup_addr;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// One way of learning a host's name
///
/// A miss is `None`; sources never raise.
#[async_trait]
pub trait HostnameSource: Send + Sync {
    async fn lookup(&self, addr: Ipv4Addr) -> Option<String>;

    fn name(&self) -> &'static str;
}

/// PTR lookup through the system resolver
pub struct ReverseDnsSource {
    limit: Duration,
}

impl ReverseDnsSource {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }
}

#[async_trait]
impl HostnameSource for ReverseDnsSource {
    fn name(&self) -> &'static str {
        "reverse DNS"
    }

    async fn lookup(&self, addr: Ipv4Addr) -> Option<String> {
        let ip = IpAddr::V4(addr);
        let task = tokio::task::spawn_blocking(move || lookup_addr(&ip));
        match timeout(self.limit, task).await {
            Ok(Ok(Ok(name))) => accept_name(&name, addr),
            Ok(Ok(Err(e))) => {
                debug!("reverse DNS for {} failed: {}", addr, e);
                None
            }
            Ok(Err(e)) => {
                debug!("reverse DNS task for {} aborted: {}", addr, e);
                None
            }
            Err(_) => {
                debug!("reverse DNS for {} timed out", addr);
                None
            }
        }
    }
}

/// NetBIOS node status query (`nmblookup -A` / `nbtstat -A`)
pub struct NetbiosSource {
    runner: Arc<dyn CommandRunner>,
    platform: Platform,
}

impl NetbiosSource {
    pub fn new(runner: Arc<dyn CommandRunner>, platform: Platform) -> Self {
        Self { runner, platform }
    }
}

#[async_trait]
impl HostnameSource for NetbiosSource {
    fn name(&self) -> &'static str {
        "NetBIOS name query"
    }

    async fn lookup(&self, addr: Ipv4Addr) -> Option<String> {
        let command = self.platform.netbios_command(addr);
        match self.runner.run(&command).await {
            Ok(output) => parse_netbios_name(&output.stdout).and_then(|n| accept_name(&n, addr)),
            Err(e) => {
                debug!("NetBIOS query for {} failed: {}", addr, e);
                None
            }
        }
    }
}

/// Name echoed back in the banner line of the ping utility
pub struct EchoBannerSource {
    runner: Arc<dyn CommandRunner>,
    platform: Platform,
    wait: Duration,
}

impl EchoBannerSource {
    pub fn new(runner: Arc<dyn CommandRunner>, platform: Platform, wait: Duration) -> Self {
        Self {
            runner,
            platform,
            wait,
        }
    }
}

#[async_trait]
impl HostnameSource for EchoBannerSource {
    fn name(&self) -> &'static str {
        "echo banner"
    }

    async fn lookup(&self, addr: Ipv4Addr) -> Option<String> {
        let command = self.platform.banner_command(addr, self.wait);
        match self.runner.run(&command).await {
            Ok(output) if output.success => parse_banner_name(&output.stdout, addr),
            Ok(_) => None,
            Err(e) => {
                debug!("echo banner for {} failed: {}", addr, e);
                None
            }
        }
    }
}

/// First NetBIOS name registered as a unique workstation record
pub fn parse_netbios_name(output: &str) -> Option<String> {
    output
        .lines()
        .find(|line| line.contains(NETBIOS_WORKSTATION) && line.contains(NETBIOS_UNIQUE))
        .and_then(|line| line.split_whitespace().next())
        .map(str::to_string)
}

/// Name from `PING name (addr) ...` or `Pinging name [addr] ...`
///
/// Windows prints a blank line before the banner, so leading blank lines are skipped.
pub fn parse_banner_name(output: &str, addr: Ipv4Addr) -> Option<String> {
    let first = output.lines().map(str::trim).find(|line| !line.is_empty())?;
    let open = first.find(['(', '['])?;
    let close = if first[open..].starts_with('(') { ')' } else { ']' };
    first[open..].find(close)?;

    let candidate = first[..open]
        .trim()
        .trim_start_matches("Pinging")
        .trim_start_matches("PING")
        .trim();
    accept_name(candidate, addr)
}

/// A usable name is non-empty, not numeric and not the address itself
fn accept_name(candidate: &str, addr: Ipv4Addr) -> Option<String> {
    let candidate = candidate.trim().trim_end_matches('.');
    if candidate.is_empty()
        || candidate == addr.to_string()
        || candidate.parse::<Ipv4Addr>().is_ok()
        || candidate.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }
    Some(candidate.to_string())
}

/// Hostname resolution through an ordered chain of sources, first hit wins
pub struct HostnameStrategy {
    sources: Vec<Box<dyn HostnameSource>>,
}

impl HostnameStrategy {
    /// Reverse DNS, then NetBIOS, then the echo banner
    pub fn new(runner: Arc<dyn CommandRunner>, platform: Platform, wait: Duration, limit: Duration) -> Self {
        Self::with_sources(vec![
            Box::new(ReverseDnsSource::new(limit)),
            Box::new(NetbiosSource::new(runner.clone(), platform)),
            Box::new(EchoBannerSource::new(runner, platform, wait)),
        ])
    }

    pub fn with_sources(sources: Vec<Box<dyn HostnameSource>>) -> Self {
        Self { sources }
    }

    pub async fn resolve(&self, addr: Ipv4Addr) -> Option<String> {
        for source in &self.sources {
            if let Some(name) = source.lookup(addr).await {
                debug!("{} resolved {} to {}", source.name(), addr, name);
                return Some(name);
            }
            debug!("{} found no name for {}", source.name(), addr);
        }
        None
    }
}

#[async_trait]
impl DeviceDetectionStrategy for HostnameStrategy {
    fn name(&self) -> &'static str {
        "hostname resolution chain"
    }

    async fn detect(&self, host: &mut HostRecord) -> Result<(), NetworkDiscoveryError> {
        host.hostname = self
            .resolve(host.address)
            .await
            .unwrap_or_else(|| UNKNOWN.to_string());
        Ok(())
    }
}
