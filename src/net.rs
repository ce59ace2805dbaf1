use crate::constants::MIN_PREFIX_LEN;
use crate::errors::NetworkDiscoveryError;
use crate::model::HostStatus;
use async_trait::async_trait;
use ipnet::{Ipv4AddrRange, Ipv4Net};
use network_interface::{Addr, NetworkInterface, NetworkInterfaceConfig};
use once_cell::sync::Lazy;
use regex::Regex;
use std::net::Ipv4Addr;
use std::process::Stdio;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Host platform capabilities: which utilities exist and how they are spelled
pub mod platform {
    use super::*;

    static CURRENT: Lazy<Platform> = Lazy::new(|| {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    });

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Platform {
        Linux,
        MacOs,
        Windows,
    }

    /// A program and its arguments, ready to be handed to a [`super::command::CommandRunner`]
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct CommandSpec {
        pub program: &'static str,
        pub args: Vec<String>,
    }

    impl CommandSpec {
        pub fn new(program: &'static str, args: &[&str]) -> Self {
            Self {
                program,
                args: args.iter().map(|a| a.to_string()).collect(),
            }
        }

        pub fn command_line(&self) -> String {
            std::iter::once(self.program.to_string())
                .chain(self.args.iter().cloned())
                .collect::<Vec<_>>()
                .join(" ")
        }
    }

    /// Output layout of a neighbor-table query
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum NeighborFormat {
        /// `ip neigh show <addr>`: `... lladdr aa:bb:cc:dd:ee:ff REACHABLE`
        IpNeigh,
        /// `arp -n <addr>`: any MAC-shaped token
        ArpTable,
        /// `arp -a`: whole table, the line holding the address carries its MAC
        WindowsArp,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct NeighborQuery {
        pub command: CommandSpec,
        pub format: NeighborFormat,
    }

    impl Platform {
        /// Platform of the running process, detected once
        pub fn current() -> Self {
            *CURRENT
        }

        /// Single echo request bounded by `wait`
        pub fn echo_command(&self, addr: Ipv4Addr, wait: Duration) -> CommandSpec {
            let addr = addr.to_string();
            let millis = wait.as_millis().max(1).to_string();
            match self {
                Platform::Windows => CommandSpec::new("ping", &["-n", "1", "-w", &millis, &addr]),
                Platform::MacOs => CommandSpec::new("ping", &["-c", "1", "-W", &millis, &addr]),
                Platform::Linux => {
                    let secs = wait.as_secs().max(1).to_string();
                    CommandSpec::new("ping", &["-c", "1", "-W", &secs, &addr])
                }
            }
        }

        /// Echo request whose banner names the target
        ///
        /// Windows only resolves and prints the name when asked with `-a`.
        pub fn banner_command(&self, addr: Ipv4Addr, wait: Duration) -> CommandSpec {
            let mut command = self.echo_command(addr, wait);
            if *self == Platform::Windows {
                command.args.insert(0, "-a".to_string());
            }
            command
        }

        /// Neighbor-table queries in the order they should be tried
        pub fn neighbor_queries(&self, addr: Ipv4Addr) -> Vec<NeighborQuery> {
            let addr = addr.to_string();
            match self {
                Platform::Windows => vec![NeighborQuery {
                    command: CommandSpec::new("arp", &["-a"]),
                    format: NeighborFormat::WindowsArp,
                }],
                Platform::Linux | Platform::MacOs => vec![
                    NeighborQuery {
                        command: CommandSpec::new("ip", &["neigh", "show", &addr]),
                        format: NeighborFormat::IpNeigh,
                    },
                    NeighborQuery {
                        command: CommandSpec::new("arp", &["-n", &addr]),
                        format: NeighborFormat::ArpTable,
                    },
                ],
            }
        }

        /// NetBIOS node status query
        pub fn netbios_command(&self, addr: Ipv4Addr) -> CommandSpec {
            let addr = addr.to_string();
            match self {
                Platform::Windows => CommandSpec::new("nbtstat", &["-A", &addr]),
                Platform::Linux | Platform::MacOs => CommandSpec::new("nmblookup", &["-A", &addr]),
            }
        }
    }
}

/// Running external utilities
pub mod command {
    use super::platform::CommandSpec;
    use super::*;

    /// Captured result of one utility invocation
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct CommandOutput {
        /// Exit status was zero
        pub success: bool,
        /// Standard output followed by standard error
        pub stdout: String,
    }

    impl CommandOutput {
        pub fn ok(stdout: impl Into<String>) -> Self {
            Self {
                success: true,
                stdout: stdout.into(),
            }
        }

        pub fn failed(stdout: impl Into<String>) -> Self {
            Self {
                success: false,
                stdout: stdout.into(),
            }
        }
    }

    /// Seam between the probers and the operating system
    ///
    /// A non-zero exit is not an error: it is reported through
    /// [`CommandOutput::success`]. Errors mean the utility could not be run
    /// at all or did not finish in time.
    #[async_trait]
    pub trait CommandRunner: Send + Sync {
        async fn run(&self, command: &CommandSpec) -> Result<CommandOutput, NetworkDiscoveryError>;
    }

    /// Runs utilities as child processes with an upper bound on their runtime
    pub struct SystemCommandRunner {
        limit: Duration,
    }

    impl SystemCommandRunner {
        pub fn new(limit: Duration) -> Self {
            Self { limit }
        }
    }

    #[async_trait]
    impl CommandRunner for SystemCommandRunner {
        async fn run(&self, command: &CommandSpec) -> Result<CommandOutput, NetworkDiscoveryError> {
            let child = tokio::process::Command::new(command.program)
                .args(&command.args)
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output();

            let output = timeout(self.limit, child)
                .await
                .map_err(|_| {
                    NetworkDiscoveryError::ProbeFailure(format!(
                        "`{}` timed out after {:?}",
                        command.command_line(),
                        self.limit
                    ))
                })?
                .map_err(|e| {
                    NetworkDiscoveryError::ProbeFailure(format!(
                        "`{}` could not be started: {}",
                        command.command_line(),
                        e
                    ))
                })?;

            let mut stdout = String::from_utf8_lossy(&output.stdout).into_owned();
            stdout.push_str(&String::from_utf8_lossy(&output.stderr));
            Ok(CommandOutput {
                success: output.status.success(),
                stdout,
            })
        }
    }
}

/// Liveness probing through the platform echo utility
pub mod ping {
    use super::command::{CommandOutput, CommandRunner};
    use super::platform::Platform;
    use super::*;

    static LATENCY: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)time=\s*([0-9]+(?:\.[0-9]+)?)\s*ms").expect("latency pattern is valid")
    });

    /// Outcome of a single echo request
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct EchoReply {
        pub status: HostStatus,
        pub latency_ms: Option<f64>,
    }

    impl EchoReply {
        pub fn unreachable() -> Self {
            Self {
                status: HostStatus::Unreachable,
                latency_ms: None,
            }
        }
    }

    /// Send exactly one echo request to `addr`
    ///
    /// Never fails: anything short of a recognisable reply marks the host
    /// unreachable.
    pub async fn probe_host(
        runner: &dyn CommandRunner,
        platform: Platform,
        addr: Ipv4Addr,
        wait: Duration,
    ) -> EchoReply {
        let command = platform.echo_command(addr, wait);
        match runner.run(&command).await {
            Ok(output) => parse_echo_output(&output),
            Err(e) => {
                debug!("echo to {} failed: {}", addr, e);
                EchoReply::unreachable()
            }
        }
    }

    /// Interpret echo utility output
    pub fn parse_echo_output(output: &CommandOutput) -> EchoReply {
        if !output.success {
            return EchoReply::unreachable();
        }
        let lower = output.stdout.to_lowercase();
        if !lower.contains("ttl=") && !lower.contains("time=") {
            return EchoReply::unreachable();
        }
        EchoReply {
            status: HostStatus::Reachable,
            latency_ms: parse_latency(&output.stdout),
        }
    }

    /// Round-trip time from the last `time=<float>ms` fragment
    pub fn parse_latency(output: &str) -> Option<f64> {
        LATENCY
            .captures_iter(output)
            .last()
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
    }
}

/// Target network selection
pub mod interface {
    use super::*;

    /// Parse a CIDR block or a bare address (taken as `/32`)
    ///
    /// Host bits are cleared, so `192.168.1.77/24` means `192.168.1.0/24`.
    pub fn parse_subnet(subnet: &str) -> Result<Ipv4Net, NetworkDiscoveryError> {
        let trimmed = subnet.trim();
        let invalid = |reason: String| NetworkDiscoveryError::InvalidSubnet {
            subnet: trimmed.to_string(),
            reason,
        };

        if trimmed.contains('/') {
            trimmed
                .parse::<Ipv4Net>()
                .map(|net| net.trunc())
                .map_err(|e| invalid(e.to_string()))
        } else {
            let addr = trimmed
                .parse::<Ipv4Addr>()
                .map_err(|e| invalid(e.to_string()))?;
            Ipv4Net::new(addr, 32).map_err(|e| invalid(e.to_string()))
        }
    }

    /// Every address in the block, network and broadcast included
    pub fn enumerate(network: &Ipv4Net) -> Vec<Ipv4Addr> {
        Ipv4AddrRange::new(network.network(), network.broadcast()).collect()
    }

    /// Reject blocks too large to enumerate into one worker per address
    pub fn ensure_scannable(network: &Ipv4Net) -> Result<(), NetworkDiscoveryError> {
        if network.prefix_len() < MIN_PREFIX_LEN {
            return Err(NetworkDiscoveryError::InvalidSubnet {
                subnet: network.to_string(),
                reason: format!(
                    "{} addresses exceed the /{} scan limit",
                    1u64 << (32 - network.prefix_len()),
                    MIN_PREFIX_LEN
                ),
            });
        }
        Ok(())
    }

    /// First candidate that is neither loopback nor link-local and has a mask
    pub fn select_local_network<I>(candidates: I) -> Option<Ipv4Net>
    where
        I: IntoIterator<Item = (Ipv4Addr, Option<Ipv4Addr>)>,
    {
        candidates.into_iter().find_map(|(ip, netmask)| {
            if ip.is_loopback() || ip.is_link_local() || ip.is_unspecified() {
                return None;
            }
            let prefix = ipnet::ipv4_mask_to_prefix(netmask?).ok()?;
            Ipv4Net::new(ip, prefix).ok().map(|net| net.trunc())
        })
    }

    /// Network of the first usable local interface
    pub fn detect_local_network() -> Result<Ipv4Net, NetworkDiscoveryError> {
        let interfaces = NetworkInterface::show()?;
        let candidates = interfaces.iter().flat_map(|interface| {
            interface.addr.iter().filter_map(|addr| match addr {
                Addr::V4(v4) => Some((v4.ip, v4.netmask)),
                Addr::V6(_) => None,
            })
        });

        select_local_network(candidates).ok_or_else(|| {
            NetworkDiscoveryError::ConfigurationError(
                "no subnet configured and no non-loopback, non-link-local IPv4 interface found"
                    .to_string(),
            )
        })
    }

    /// Explicit subnet when given (blank counts as absent), otherwise autodetect
    ///
    /// Blocks shorter than `/16` are refused before anything is enumerated.
    pub fn resolve_subnet(subnet: Option<&str>) -> Result<Ipv4Net, NetworkDiscoveryError> {
        let network = match subnet.map(str::trim).filter(|s| !s.is_empty()) {
            Some(explicit) => parse_subnet(explicit)?,
            None => {
                let network = detect_local_network()?;
                debug!("autodetected local network {}", network);
                network
            }
        };
        ensure_scannable(&network)?;
        Ok(network)
    }

    /// Print available interfaces and the network each one would scan
    pub fn list_network_interfaces() -> Result<(), NetworkDiscoveryError> {
        let interfaces = NetworkInterface::show()?;
        println!("Available network interfaces:");
        for interface in interfaces {
            println!("  Interface: {}", interface.name);
            for addr in &interface.addr {
                if let Addr::V4(v4) = addr {
                    match select_local_network([(v4.ip, v4.netmask)]) {
                        Some(network) => println!("    IPv4: {} -> Network: {}", v4.ip, network),
                        None => println!("    IPv4: {} (skipped)", v4.ip),
                    }
                }
            }
        }
        Ok(())
    }

    /// Warn about blocks large enough to strain the worker pool
    pub(crate) fn warn_if_large(network: &Ipv4Net) {
        if network.prefix_len() < 20 {
            warn!(
                "subnet {} holds {} addresses; the scan will take a while",
                network,
                1u64 << (32 - network.prefix_len())
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::command::CommandOutput;
    use super::platform::Platform;
    use super::*;

    #[test]
    fn linux_echo_latency() {
        let out = CommandOutput::ok(
            "PING 192.168.1.1 (192.168.1.1) 56(84) bytes of data.\n\
             64 bytes from 192.168.1.1: icmp_seq=1 ttl=64 time=0.412 ms\n",
        );
        let reply = ping::parse_echo_output(&out);
        assert_eq!(reply.status, HostStatus::Reachable);
        assert_eq!(reply.latency_ms, Some(0.412));
    }

    #[test]
    fn windows_sub_millisecond_reply_has_no_latency() {
        let out = CommandOutput::ok("Reply from 10.0.0.2: bytes=32 time<1ms TTL=128\n");
        let reply = ping::parse_echo_output(&out);
        assert_eq!(reply.status, HostStatus::Reachable);
        assert_eq!(reply.latency_ms, None);
    }

    #[test]
    fn windows_reply_latency() {
        let out = CommandOutput::ok("Reply from 10.0.0.2: bytes=32 time=14ms TTL=128\n");
        assert_eq!(ping::parse_echo_output(&out).latency_ms, Some(14.0));
    }

    #[test]
    fn failed_exit_is_unreachable_even_with_markers() {
        let out = CommandOutput::failed("From 10.0.0.1 icmp_seq=1 Destination Host Unreachable ttl=");
        assert_eq!(ping::parse_echo_output(&out), ping::EchoReply::unreachable());
    }

    #[test]
    fn success_without_markers_is_unreachable() {
        let out = CommandOutput::ok("1 packets transmitted, 0 received, 100% packet loss\n");
        assert_eq!(ping::parse_echo_output(&out).status, HostStatus::Unreachable);
    }

    #[test]
    fn echo_command_spelling_per_platform() {
        let addr = Ipv4Addr::new(10, 1, 1, 1);
        let wait = Duration::from_millis(1000);
        assert_eq!(
            Platform::Linux.echo_command(addr, wait).args,
            vec!["-c", "1", "-W", "1", "10.1.1.1"]
        );
        assert_eq!(
            Platform::Windows.echo_command(addr, wait).args,
            vec!["-n", "1", "-w", "1000", "10.1.1.1"]
        );
        assert_eq!(
            Platform::Windows.banner_command(addr, wait).command_line(),
            "ping -a -n 1 -w 1000 10.1.1.1"
        );
        assert_eq!(
            Platform::Linux.banner_command(addr, wait),
            Platform::Linux.echo_command(addr, wait)
        );
        assert_eq!(Platform::Windows.neighbor_queries(addr).len(), 1);
        assert_eq!(Platform::Linux.neighbor_queries(addr).len(), 2);
    }
}
