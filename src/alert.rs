use crate::model::{HostRecord, HostStatus};
use std::fmt;

/// Why a host needs attention
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlertReason {
    Unreachable,
    HighLatency { latency_ms: f64, threshold_ms: f64 },
}

impl fmt::Display for AlertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertReason::Unreachable => f.write_str("unreachable"),
            AlertReason::HighLatency {
                latency_ms,
                threshold_ms,
            } => write!(f, "latency {:.1} ms above {:.1} ms", latency_ms, threshold_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alert<'a> {
    pub record: &'a HostRecord,
    pub reason: AlertReason,
}

/// Records that are unreachable or slower than `threshold_ms`, in input order
pub fn select(records: &[HostRecord], threshold_ms: f64) -> Vec<Alert<'_>> {
    records
        .iter()
        .filter_map(|record| {
            let reason = match (record.status, record.latency_ms) {
                (HostStatus::Unreachable, _) => AlertReason::Unreachable,
                (HostStatus::Reachable, Some(latency_ms)) if latency_ms > threshold_ms => {
                    AlertReason::HighLatency {
                        latency_ms,
                        threshold_ms,
                    }
                }
                _ => return None,
            };
            Some(Alert { record, reason })
        })
        .collect()
}

/// One consolidated message covering every alert
pub fn summarize(alerts: &[Alert<'_>]) -> String {
    alerts
        .iter()
        .map(|a| format!("{} ({}): {}", a.record.address, a.record.hostname, a.reason))
        .collect::<Vec<_>>()
        .join("; ")
}
