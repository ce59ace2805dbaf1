use crate::constants::HIGH_LATENCY_MS;
use crate::errors::NetworkDiscoveryError;
use crate::model::HostRecord;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Output format selectable from config or the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Console table only, nothing written to disk
    #[default]
    Table,
    Json,
    Csv,
    /// Standalone styled page with a summary dashboard
    Html,
}

/// Writes a finished result set to a report file
pub trait Reporter {
    /// Write `records` and return the path of the report
    fn generate(&self, records: &[HostRecord], log_file: Option<&Path>) -> Result<PathBuf, NetworkDiscoveryError>;
}

/// File-writing reporter for `format`, if the format has one
pub fn reporter_for(format: ReportFormat, dir: impl Into<PathBuf>, run_id: &str) -> Option<Box<dyn Reporter>> {
    let dir = dir.into();
    match format {
        ReportFormat::Table => None,
        ReportFormat::Json => Some(Box::new(JsonReporter::new(dir, run_id))),
        ReportFormat::Csv => Some(Box::new(CsvReporter::new(dir, run_id))),
        ReportFormat::Html => Some(Box::new(HtmlReporter::new(dir, run_id))),
    }
}

fn report_path(dir: &Path, run_id: &str, extension: &str) -> Result<PathBuf, NetworkDiscoveryError> {
    fs::create_dir_all(dir).map_err(|e| {
        NetworkDiscoveryError::ReportWriteFailure(format!("cannot create {}: {}", dir.display(), e))
    })?;
    Ok(dir.join(format!("report_{}.{}", run_id, extension)))
}

fn write_report(path: &Path, contents: &str) -> Result<(), NetworkDiscoveryError> {
    fs::write(path, contents).map_err(|e| {
        NetworkDiscoveryError::ReportWriteFailure(format!("cannot write {}: {}", path.display(), e))
    })
}

pub struct JsonReporter {
    dir: PathBuf,
    run_id: String,
}

impl JsonReporter {
    pub fn new(dir: impl Into<PathBuf>, run_id: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            run_id: run_id.into(),
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    run_id: &'a str,
    log_file: Option<&'a Path>,
    hosts: &'a [HostRecord],
}

impl Reporter for JsonReporter {
    fn generate(&self, records: &[HostRecord], log_file: Option<&Path>) -> Result<PathBuf, NetworkDiscoveryError> {
        let path = report_path(&self.dir, &self.run_id, "json")?;
        let body = serde_json::to_string_pretty(&JsonReport {
            run_id: &self.run_id,
            log_file,
            hosts: records,
        })
        .map_err(|e| NetworkDiscoveryError::ReportWriteFailure(e.to_string()))?;
        write_report(&path, &body)?;
        Ok(path)
    }
}

pub struct CsvReporter {
    dir: PathBuf,
    run_id: String,
}

impl CsvReporter {
    pub const HEADER: [&'static str; 7] = ["ip", "mac", "vendor", "hostname", "status", "latency", "open_ports"];

    pub fn new(dir: impl Into<PathBuf>, run_id: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            run_id: run_id.into(),
        }
    }

    /// Whole document, header included
    pub fn render(records: &[HostRecord]) -> String {
        let mut out = Self::HEADER.join(",");
        out.push_str("\r\n");
        for record in records {
            let ports = joined_ports(&record.open_ports).unwrap_or_else(|| "None".to_string());
            let row = [
                record.address.to_string(),
                record.mac_address.clone(),
                record.vendor.clone(),
                record.hostname.clone(),
                record.status.to_string(),
                record.latency_ms.map(|l| l.to_string()).unwrap_or_default(),
                ports,
            ];
            out.push_str(&row.iter().map(|f| escape_field(f)).collect::<Vec<_>>().join(","));
            out.push_str("\r\n");
        }
        out
    }
}

fn joined_ports(ports: &[u16]) -> Option<String> {
    (!ports.is_empty()).then(|| {
        ports
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    })
}

/// Quote a field when it holds a delimiter, quote or line break
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

impl Reporter for CsvReporter {
    fn generate(&self, records: &[HostRecord], _log_file: Option<&Path>) -> Result<PathBuf, NetworkDiscoveryError> {
        let path = report_path(&self.dir, &self.run_id, "csv")?;
        write_report(&path, &Self::render(records))?;
        Ok(path)
    }
}

const HTML_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Network Scan Report</title>
<style>
body { font-family: system-ui, sans-serif; margin: 2rem; background: #f3f4f6; color: #1f2937; }
.cards { display: grid; grid-template-columns: repeat(auto-fit, minmax(12rem, 1fr)); gap: 1rem; margin-bottom: 1.5rem; }
.card, .panel { background: #fff; border-radius: 0.75rem; padding: 1rem 1.5rem; box-shadow: 0 1px 3px rgba(0, 0, 0, 0.1); }
.label { font-size: 0.85rem; color: #6b7280; margin: 0; }
.value { font-size: 1.6rem; font-weight: 700; margin: 0.25rem 0 0; }
.bar { background: #e5e7eb; border-radius: 9999px; height: 1rem; }
.bar > div { background: #22c55e; border-radius: 9999px; height: 1rem; }
table { width: 100%; border-collapse: collapse; margin-top: 1.5rem; background: #fff; }
th, td { text-align: left; padding: 0.6rem 1rem; border-bottom: 1px solid #e5e7eb; font-size: 0.9rem; }
th { text-transform: uppercase; font-size: 0.75rem; color: #6b7280; }
.badge { padding: 0.1rem 0.6rem; border-radius: 9999px; font-size: 0.75rem; font-weight: 600; }
.reachable { background: #dcfce7; color: #166534; }
.unreachable { background: #fee2e2; color: #991b1b; }
.slow { font-weight: 600; color: #ca8a04; }
.muted { color: #9ca3af; }
@media (prefers-color-scheme: dark) {
  body { background: #111827; color: #e5e7eb; }
  .card, .panel, table { background: #1f2937; }
  th, td { border-color: #374151; }
}
</style>
</head>
<body>
"#;

/// Styled standalone page: summary dashboard, reachability bar and host table
pub struct HtmlReporter {
    dir: PathBuf,
    run_id: String,
    latency_threshold_ms: f64,
}

/// Figures shown on the dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSummary {
    pub total: usize,
    pub reachable: usize,
    pub unreachable: usize,
    /// Mean over reachable hosts that reported a latency, `0.0` when none did
    pub average_latency_ms: f64,
    pub reachable_percent: f64,
}

impl ReportSummary {
    pub fn of(records: &[HostRecord]) -> Self {
        let total = records.len();
        let reachable = records.iter().filter(|r| r.is_reachable()).count();
        let latencies: Vec<f64> = records
            .iter()
            .filter(|r| r.is_reachable())
            .filter_map(|r| r.latency_ms)
            .collect();
        let average_latency_ms = if latencies.is_empty() {
            0.0
        } else {
            latencies.iter().sum::<f64>() / latencies.len() as f64
        };
        let reachable_percent = if total == 0 {
            0.0
        } else {
            reachable as f64 * 100.0 / total as f64
        };

        Self {
            total,
            reachable,
            unreachable: total - reachable,
            average_latency_ms,
            reachable_percent,
        }
    }
}

impl HtmlReporter {
    pub fn new(dir: impl Into<PathBuf>, run_id: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            run_id: run_id.into(),
            latency_threshold_ms: HIGH_LATENCY_MS,
        }
    }

    /// Highlight latencies above `threshold_ms`
    pub fn with_latency_threshold(mut self, threshold_ms: f64) -> Self {
        self.latency_threshold_ms = threshold_ms;
        self
    }

    pub fn render(&self, records: &[HostRecord], log_file: Option<&Path>) -> String {
        let summary = ReportSummary::of(records);
        let mut out = String::from(HTML_HEAD);

        out.push_str(&format!(
            "<header><h1>Network Scan Report</h1><p>Run {} &middot; generated {}</p></header>\n",
            escape_html(&self.run_id),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        ));

        out.push_str("<div class=\"cards\">\n");
        for (label, value) in [
            ("Total Devices", summary.total.to_string()),
            ("Reachable", summary.reachable.to_string()),
            ("Unreachable", summary.unreachable.to_string()),
            ("Avg. Latency", format!("{:.2} ms", summary.average_latency_ms)),
        ] {
            out.push_str(&format!(
                "<div class=\"card\"><p class=\"label\">{}</p><p class=\"value\">{}</p></div>\n",
                label, value
            ));
        }
        out.push_str("</div>\n");

        let log_link = match log_file {
            Some(path) => format!(
                "<a href=\"{}\">View Log File</a>",
                escape_html(&log_href(path))
            ),
            None => "<span class=\"muted\">Not Available</span>".to_string(),
        };
        out.push_str(&format!(
            "<div class=\"panel\"><h3>Device Reachability</h3><p>{}</p>\n\
             <div class=\"bar\"><div style=\"width: {:.1}%\"></div></div>\n\
             <p>{:.1}% Reachable</p></div>\n",
            log_link, summary.reachable_percent, summary.reachable_percent
        ));

        out.push_str(
            "<table>\n<thead><tr><th>#</th><th>IP Address</th><th>MAC Address</th>\
             <th>MAC Vendor</th><th>Hostname</th><th>Status</th><th>Latency (ms)</th>\
             <th>Open Ports</th></tr></thead>\n<tbody>\n",
        );
        if records.is_empty() {
            out.push_str("<tr><td colspan=\"8\" class=\"muted\">No devices found in the scan.</td></tr>\n");
        }
        for (index, record) in records.iter().enumerate() {
            out.push_str(&self.render_row(index + 1, record));
        }
        out.push_str("</tbody>\n</table>\n</body>\n</html>\n");
        out
    }

    fn render_row(&self, index: usize, record: &HostRecord) -> String {
        let status_class = if record.is_reachable() { "reachable" } else { "unreachable" };
        let latency = match record.latency_ms {
            None => "<span class=\"muted\">N/A</span>".to_string(),
            Some(l) if l > self.latency_threshold_ms => format!("<span class=\"slow\">{}</span>", l),
            Some(l) => l.to_string(),
        };
        let ports = joined_ports(&record.open_ports)
            .unwrap_or_else(|| "<span class=\"muted\">None</span>".to_string());

        format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>\
             <td><span class=\"badge {}\">{}</span></td><td>{}</td><td>{}</td></tr>\n",
            index,
            record.address,
            escape_html(&record.mac_address),
            escape_html(&record.vendor),
            escape_html(&record.hostname),
            status_class,
            record.status,
            latency,
            ports
        )
    }
}

impl Reporter for HtmlReporter {
    fn generate(&self, records: &[HostRecord], log_file: Option<&Path>) -> Result<PathBuf, NetworkDiscoveryError> {
        let path = report_path(&self.dir, &self.run_id, "html")?;
        write_report(&path, &self.render(records, log_file))?;
        Ok(path)
    }
}

/// Relative log paths are taken from the working directory, one level above the report
fn log_href(path: &Path) -> String {
    if path.is_absolute() {
        path.display().to_string()
    } else {
        format!("../{}", path.display())
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
