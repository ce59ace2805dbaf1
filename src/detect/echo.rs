use super::DeviceDetectionStrategy;
use crate::errors::NetworkDiscoveryError;
use crate::model::HostRecord;
use crate::net::command::CommandRunner;
use crate::net::ping::probe_host;
use crate::net::platform::Platform;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Liveness and round-trip time from a single echo request
pub struct EchoProbeStrategy {
    runner: Arc<dyn CommandRunner>,
    platform: Platform,
    wait: Duration,
}

impl EchoProbeStrategy {
    pub fn new(runner: Arc<dyn CommandRunner>, platform: Platform, wait: Duration) -> Self {
        Self {
            runner,
            platform,
            wait,
        }
    }
}

#[async_trait]
impl DeviceDetectionStrategy for EchoProbeStrategy {
    fn name(&self) -> &'static str {
        "ICMP echo probe"
    }

    async fn detect(&self, host: &mut HostRecord) -> Result<(), NetworkDiscoveryError> {
        let reply = probe_host(self.runner.as_ref(), self.platform, host.address, self.wait).await;
        host.status = reply.status;
        host.latency_ms = reply.latency_ms;
        Ok(())
    }
}
