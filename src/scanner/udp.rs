//! UDP probe.
//!
//! UDP is connectionless, so this probe can only tell whether a socket could
//! be set up towards the port and a datagram written to it. `open` here is
//! much weaker evidence than a TCP `open`: there is no read step, so a
//! filtered port or one with no responder looks the same as a live service.

use crate::config::ProbeTimeoutPolicy;
use crate::error::{ProbeError, ProbeResult};
use crate::scanner::traits::{PortStatus, ProbeOutcome, Prober, Protocol};
use crate::types::{Port, ScanTarget};
use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::time::timeout;

/// Payload written to every UDP port.
pub const PROBE_PAYLOAD: &[u8] = b"test";

/// UDP setup-and-write probe.
pub struct UdpProbe {
    host: String,
    target: IpAddr,
    policy: Arc<ProbeTimeoutPolicy>,
}

impl UdpProbe {
    pub fn new(target: &ScanTarget, policy: Arc<ProbeTimeoutPolicy>) -> Self {
        Self {
            host: target.host.clone(),
            target: target.ip,
            policy,
        }
    }

    async fn send_probe(&self, addr: SocketAddr) -> ProbeResult<()> {
        let local_addr = if self.target.is_ipv4() {
            SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0)
        } else {
            SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0)
        };

        let socket = UdpSocket::bind(local_addr).await?;
        socket.connect(addr).await.map_err(ProbeError::from_connect)?;
        socket.send(PROBE_PAYLOAD).await?;
        Ok(())
    }
}

#[async_trait]
impl Prober for UdpProbe {
    fn protocol(&self) -> Protocol {
        Protocol::Udp
    }

    fn target(&self) -> IpAddr {
        self.target
    }

    async fn probe(&self, port: Port) -> ProbeOutcome {
        let addr = SocketAddr::new(self.target, port.as_u16());

        let status = match timeout(self.policy.timeout, self.send_probe(addr)).await {
            Ok(Ok(())) => PortStatus::Open,
            Ok(Err(e)) => {
                tracing::debug!(%addr, error = %e, "udp probe failed");
                PortStatus::Closed
            }
            Err(_) => {
                tracing::debug!(%addr, "udp probe timed out");
                PortStatus::Closed
            }
        };

        ProbeOutcome::new(&self.host, port, Protocol::Udp, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PortRange;
    use std::time::Duration;

    fn probe_for(port: Port) -> UdpProbe {
        let target = ScanTarget::new(
            "127.0.0.1",
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            PortRange::new(port, port).unwrap(),
        );
        UdpProbe::new(&target, Arc::new(ProbeTimeoutPolicy::default()))
    }

    #[tokio::test]
    async fn test_write_reaches_listener() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = Port::new(server.local_addr().unwrap().port()).unwrap();

        let outcome = probe_for(port).probe(port).await;
        assert_eq!(outcome.status, PortStatus::Open);
        assert_eq!(outcome.protocol, Protocol::Udp);

        let mut buf = [0u8; 16];
        let (n, _) = tokio::time::timeout(Duration::from_secs(1), server.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&buf[..n], PROBE_PAYLOAD);
    }

    #[tokio::test]
    async fn test_no_listener_still_reports_open() {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = Port::new(socket.local_addr().unwrap().port()).unwrap();
        drop(socket);

        let outcome = probe_for(port).probe(port).await;
        assert_eq!(outcome.status, PortStatus::Open);
        assert!(outcome.banner.is_none());
    }
}
