use super::DeviceDetectionStrategy;
use crate::errors::NetworkDiscoveryError;
use crate::model::HostRecord;
use async_trait::async_trait;
use std::net::Ipv4Addr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

/// TCP connect probe over the configured port list
///
/// Ports are tried one after another; a port is open when the connection
/// completes within the timeout. Nothing is read from or written to the
/// socket.
pub struct PortScanStrategy {
    ports: Vec<u16>,
    connect_timeout: Duration,
}

impl PortScanStrategy {
    pub fn new(ports: Vec<u16>, connect_timeout: Duration) -> Self {
        Self {
            ports,
            connect_timeout,
        }
    }

    pub fn ports(&self) -> &[u16] {
        &self.ports
    }

    /// Open ports of `addr`, in configured order
    pub async fn scan(&self, addr: Ipv4Addr) -> Vec<u16> {
        let mut open_ports = Vec::new();
        for &port in &self.ports {
            if is_port_open(addr, port, self.connect_timeout).await {
                open_ports.push(port);
            }
        }
        open_ports
    }
}

pub async fn is_port_open(addr: Ipv4Addr, port: u16, connect_timeout: Duration) -> bool {
    match timeout(connect_timeout, TcpStream::connect((addr, port))).await {
        Ok(Ok(_stream)) => true,
        Ok(Err(e)) => {
            trace!("{}:{} refused: {}", addr, port, e);
            false
        }
        Err(_) => {
            trace!("{}:{} timed out", addr, port);
            false
        }
    }
}

#[async_trait]
impl DeviceDetectionStrategy for PortScanStrategy {
    fn name(&self) -> &'static str {
        "TCP connect port probe"
    }

    async fn detect(&self, host: &mut HostRecord) -> Result<(), NetworkDiscoveryError> {
        host.open_ports = self.scan(host.address).await;
        Ok(())
    }
}
