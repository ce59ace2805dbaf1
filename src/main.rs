// ==========================================================
//  lanwatch  - periodic local network discovery
// ==========================================================

use anyhow::Context;
use clap::Parser;
use lanwatch::config::Overrides;
use lanwatch::net::interface;
use lanwatch::report::{reporter_for, ReportFormat};
use lanwatch::{alert, schedule, table, NetworkDiscovery, ScanConfig, ScanRun};
use std::fs::{self, File};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_CONFIG: &str = "config.json";

#[derive(Parser)]
#[command(name = "lanwatch")]
#[command(about = "Discover hosts on the local network and report on them.")]
struct CommandLine {
    /// JSON configuration file (defaults apply when it is absent)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scan a single IP address
    #[arg(long, conflicts_with = "range")]
    ip: Option<Ipv4Addr>,

    /// Override the subnet to scan (e.g. 192.168.1.0/24)
    #[arg(long)]
    range: Option<String>,

    /// Autodetect the local subnet, ignoring the configured one
    #[arg(long = "self")]
    self_scan: bool,

    /// Report format
    #[arg(short, long, value_enum)]
    format: Option<ReportFormat>,

    /// Maximum number of hosts probed at the same time
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Repeat the scan every MINUTES until interrupted
    #[arg(long, value_name = "MINUTES")]
    interval: Option<u64>,

    /// List available network interfaces and exit
    #[arg(long)]
    list: bool,
}

impl CommandLine {
    fn overrides(&self) -> Overrides {
        Overrides {
            range: self.range.clone(),
            ip: self.ip,
            self_scan: self.self_scan,
            format: self.format,
            jobs: self.jobs,
            interval: self.interval,
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ScanConfig> {
    match path {
        Some(path) => ScanConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None if Path::new(DEFAULT_CONFIG).exists() => {
            ScanConfig::from_file(DEFAULT_CONFIG).context("loading config.json")
        }
        None => Ok(ScanConfig::default()),
    }
}

/// Console plus a per-run log file named after the run
fn init_logging(log_dir: &Path, run: &ScanRun) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;
    let log_file = log_dir.join(format!("scan_{}.log", run.run_id));
    let file = File::create(&log_file)
        .with_context(|| format!("creating log file {}", log_file.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .init();

    Ok(log_file)
}

/// One scan followed by its console table, report and alerts
async fn scan_cycle(
    config: &ScanConfig,
    run: &ScanRun,
    log_file: &Path,
    token: CancellationToken,
) -> anyhow::Result<()> {
    let discovery = NetworkDiscovery::new(config.clone());
    let results = discovery.discover_with(run, token).await?;
    let records = results.records();

    println!("{}", table::render(records));

    if let Some(reporter) = reporter_for(config.report_format, &config.report_dir, &run.run_id) {
        let path = reporter.generate(records, Some(log_file))?;
        info!("report generated: {}", path.display());
    }

    let alerts = alert::select(records, config.latency_threshold_ms);
    if alerts.is_empty() {
        info!("no alert conditions detected");
    } else {
        warn!("{} hosts need attention: {}", alerts.len(), alert::summarize(&alerts));
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse();

    if commands.list {
        interface::list_network_interfaces()?;
        return Ok(());
    }

    let mut config = load_config(commands.config.as_deref())?;
    config.apply(&commands.overrides());

    let first_run = ScanRun::new();
    let log_file = init_logging(&config.log_dir, &first_run)?;
    info!("run {} logging to {}", first_run.run_id, log_file.display());

    // Ctrl-C stops pending workers; finished hosts are still reported
    let token = CancellationToken::new();
    let ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping scan");
            ctrl_c.cancel();
        }
    });

    let Some(every) = config.scan_interval() else {
        return scan_cycle(&config, &first_run, &log_file, token).await;
    };

    info!("scanning every {} minutes until interrupted", every.as_secs() / 60);
    let config = &config;
    let log_file = log_file.as_path();
    let cycle_token = token.clone();
    let mut first_run = Some(first_run);
    schedule::run_every(every, token, |cycle| {
        let run = first_run.take().unwrap_or_default();
        let token = cycle_token.clone();
        async move {
            info!("cycle {} starting as run {}", cycle, run.run_id);
            if let Err(e) = scan_cycle(config, &run, log_file, token).await {
                error!("cycle {} failed: {:#}", cycle, e);
            }
        }
    })
    .await;

    Ok(())
}
