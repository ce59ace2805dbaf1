use crate::config::ScanConfig;
use crate::db::oui::MacVendorDatabase;
use crate::detect::{
    echo::EchoProbeStrategy, hostname::HostnameStrategy, mac::MacAddressStrategy,
    port::PortScanStrategy, DeviceDetectionStrategy,
};
use crate::errors::NetworkDiscoveryError;
use crate::model::{HostRecord, ResultSet};
use crate::net::command::{CommandRunner, SystemCommandRunner};
use crate::net::interface;
use crate::net::platform::Platform;
use futures::future::join_all;
use ipnet::Ipv4Net;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

/// Identity of one scan run, shared by its log events and its report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRun {
    pub run_id: String,
}

impl ScanRun {
    /// Run named after the local start time, e.g. `2025-03-01_14-05-09`
    pub fn new() -> Self {
        Self {
            run_id: chrono::Local::now().format("%Y-%m-%d_%H-%M-%S").to_string(),
        }
    }

    pub fn with_id(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
        }
    }
}

impl Default for ScanRun {
    fn default() -> Self {
        Self::new()
    }
}

/// Discovery engine: one worker per candidate address, every detection
/// strategy per worker, results merged into a single [`ResultSet`]
pub struct NetworkDiscovery {
    strategies: Arc<Vec<Box<dyn DeviceDetectionStrategy>>>,
    config: ScanConfig,
}

impl NetworkDiscovery {
    /// Engine backed by the real system utilities of the current platform
    pub fn new(config: ScanConfig) -> Self {
        let runner: Arc<dyn CommandRunner> =
            Arc::new(SystemCommandRunner::new(config.command_timeout()));
        Self::with_runner(config, runner, Platform::current())
    }

    /// Engine whose utilities are run through `runner`
    ///
    /// The OUI table is loaded here, once, and shared read-only by all workers.
    pub fn with_runner(config: ScanConfig, runner: Arc<dyn CommandRunner>, platform: Platform) -> Self {
        let vendor_db = Arc::new(MacVendorDatabase::load(&config.oui_path));
        let wait = config.ping_timeout();

        let strategies: Vec<Box<dyn DeviceDetectionStrategy>> = vec![
            Box::new(EchoProbeStrategy::new(runner.clone(), platform, wait)),
            Box::new(HostnameStrategy::new(
                runner.clone(),
                platform,
                wait,
                config.command_timeout(),
            )),
            Box::new(MacAddressStrategy::new(runner, platform, vendor_db, wait)),
            Box::new(PortScanStrategy::new(
                config.ports.clone(),
                config.tcp_connect_timeout(),
            )),
        ];

        Self::with_strategies(config, strategies)
    }

    /// Engine running exactly `strategies`, in order, for every address
    pub fn with_strategies(config: ScanConfig, strategies: Vec<Box<dyn DeviceDetectionStrategy>>) -> Self {
        Self {
            strategies: Arc::new(strategies),
            config,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Set the maximum number of hosts probed at the same time
    pub fn set_concurrency(&mut self, jobs: usize) {
        self.config.max_concurrent_scans = jobs.max(1);
    }

    /// Target network and its candidate addresses
    pub fn resolve_targets(&self) -> Result<(Ipv4Net, Vec<Ipv4Addr>), NetworkDiscoveryError> {
        let network = interface::resolve_subnet(self.config.subnet.as_deref())?;
        interface::warn_if_large(&network);
        Ok((network, interface::enumerate(&network)))
    }

    /// Scan the configured subnet to completion
    pub async fn discover(&self) -> Result<ResultSet, NetworkDiscoveryError> {
        self.discover_with(&ScanRun::new(), CancellationToken::new())
            .await
    }

    /// Scan the configured subnet as `run`, stopping early if `token` is cancelled
    ///
    /// Fails only when no target network can be established; that happens
    /// before any worker starts. After cancellation the records finished so
    /// far are returned.
    pub async fn discover_with(
        &self,
        run: &ScanRun,
        token: CancellationToken,
    ) -> Result<ResultSet, NetworkDiscoveryError> {
        let (network, addresses) = self.resolve_targets()?;
        let span = info_span!("scan", run_id = %run.run_id, subnet = %network);
        self.scan_addresses(addresses, token).instrument(span).await
    }

    /// Probe an explicit address list
    pub async fn scan_addresses(
        &self,
        addresses: Vec<Ipv4Addr>,
        token: CancellationToken,
    ) -> Result<ResultSet, NetworkDiscoveryError> {
        let scan_start = Instant::now();
        let total = addresses.len();
        info!(
            "starting scan of {} addresses with up to {} concurrent workers",
            total,
            self.config.concurrency()
        );

        let results = Arc::new(Mutex::new(ResultSet::new()));
        let permits = Arc::new(Semaphore::new(self.config.concurrency()));
        let completed = Arc::new(AtomicUsize::new(0));

        // Spawn one worker per candidate address
        let mut handles = Vec::with_capacity(total);
        for addr in addresses {
            let strategies = self.strategies.clone();
            let results = results.clone();
            let permits = permits.clone();
            let completed = completed.clone();
            let token = token.clone();
            let span = info_span!("host", %addr);

            handles.push(tokio::spawn(
                async move {
                    let _permit = tokio::select! {
                        biased;
                        _ = token.cancelled() => return,
                        permit = permits.acquire_owned() => match permit {
                            Ok(permit) => permit,
                            Err(_) => return,
                        },
                    };

                    let Some(record) = probe_host(addr, &strategies, &token).await else {
                        debug!("cancelled before completion");
                        return;
                    };

                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    if record.is_phantom() {
                        debug!("skipping {}: likely no device present ({}/{})", addr, done, total);
                        return;
                    }

                    let mut set = results.lock().await;
                    if set.insert(record) {
                        info!("host recorded ({}/{})", done, total);
                    } else {
                        warn!("duplicate record for {} dropped", addr);
                    }
                }
                .instrument(span),
            ));
        }

        for joined in join_all(handles).await {
            if let Err(e) = joined {
                warn!("worker terminated abnormally: {}", e);
            }
        }

        let set = std::mem::take(&mut *results.lock().await);
        info!(
            "scan complete in {:.2}s: {} of {} addresses recorded{}",
            scan_start.elapsed().as_secs_f64(),
            set.len(),
            total,
            if token.is_cancelled() { " (cancelled)" } else { "" }
        );
        Ok(set)
    }
}

/// Run every strategy against `addr`; `None` when cancelled midway
async fn probe_host(
    addr: Ipv4Addr,
    strategies: &[Box<dyn DeviceDetectionStrategy>],
    token: &CancellationToken,
) -> Option<HostRecord> {
    let mut record = HostRecord::new(addr);
    for strategy in strategies {
        tokio::select! {
            biased;
            _ = token.cancelled() => return None,
            outcome = strategy.detect(&mut record) => {
                if let Err(e) = outcome {
                    debug!("{} skipped: {}", strategy.name(), e);
                }
            }
        }
    }
    Some(record)
}
