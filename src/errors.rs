use thiserror::Error;

/// Error types for network discovery operations
///
/// Only `ConfigurationError` and `InvalidSubnet` ever reach the caller of a
/// scan. `ProbeFailure` is produced per host and per resolution step and is
/// absorbed by the resolver that raised it.
#[derive(Error, Debug)]
pub enum NetworkDiscoveryError {
    #[error("Configuration Error: {0}")]
    ConfigurationError(String),

    #[error("Invalid subnet '{subnet}': {reason}")]
    InvalidSubnet { subnet: String, reason: String },

    #[error("Probe Failure: {0}")]
    ProbeFailure(String),

    #[error("Report Write Failure: {0}")]
    ReportWriteFailure(String),

    #[error("Config File Error: {0}")]
    ConfigFile(#[from] serde_json::Error),

    #[error("I/O Error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Network Interface Error: {0}")]
    NetworkInterfaceWrapped(#[from] network_interface::Error),
}
