use crate::errors::NetworkDiscoveryError;
use crate::model::HostRecord;
use async_trait::async_trait;

pub mod echo;
pub mod hostname;
pub mod mac;
pub mod port;

/// Device detection strategy trait
///
/// Each strategy fills in one aspect of a [`HostRecord`] (liveness,
/// hostname, link-layer address, open ports). Strategies degrade to the
/// record's defaults on their own; an `Err` only reports that the step was
/// skipped and is never fatal to the scan.
#[async_trait]
pub trait DeviceDetectionStrategy: Send + Sync {
    /// Perform detection on the given host, modifying it in place
    async fn detect(&self, host: &mut HostRecord) -> Result<(), NetworkDiscoveryError>;

    /// Return a human-readable name for this detection strategy
    fn name(&self) -> &'static str;
}
