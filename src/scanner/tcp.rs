//! TCP connect probe.
//!
//! Completes a full TCP handshake to decide whether a port is open, then
//! optionally reads a banner and inspects a TLS certificate.

use crate::banner::grab_banner;
use crate::certificate::grab_certificate;
use crate::config::ProbeTimeoutPolicy;
use crate::error::{ProbeError, ProbeResult};
use crate::scanner::traits::{PortStatus, ProbeOutcome, Prober, Protocol};
use crate::types::{Port, ScanTarget};
use async_trait::async_trait;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// TCP connect probe.
///
/// Every connect failure (refused, timed out, unreachable) is reported as
/// `closed`; the failure kind is only logged.
pub struct TcpProbe {
    host: String,
    target: IpAddr,
    policy: Arc<ProbeTimeoutPolicy>,
}

impl TcpProbe {
    pub fn new(target: &ScanTarget, policy: Arc<ProbeTimeoutPolicy>) -> Self {
        Self {
            host: target.host.clone(),
            target: target.ip,
            policy,
        }
    }

    async fn attempt_connect(&self, addr: SocketAddr) -> ProbeResult<TcpStream> {
        match timeout(self.policy.timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) => Err(ProbeError::from_connect(e)),
            Err(_) => Err(ProbeError::Timeout),
        }
    }
}

#[async_trait]
impl Prober for TcpProbe {
    fn protocol(&self) -> Protocol {
        Protocol::Tcp
    }

    fn target(&self) -> IpAddr {
        self.target
    }

    async fn probe(&self, port: Port) -> ProbeOutcome {
        let addr = SocketAddr::new(self.target, port.as_u16());

        let mut stream = match self.attempt_connect(addr).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::debug!(%addr, error = %e, "tcp port closed");
                return ProbeOutcome::new(&self.host, port, Protocol::Tcp, PortStatus::Closed);
            }
        };

        let banner = if self.policy.enable_banner {
            grab_banner(&mut stream, self.policy.banner_timeout).await
        } else {
            None
        };
        drop(stream);

        let certificate = if self.policy.tls_applies(port.as_u16()) {
            match grab_certificate(addr, &self.host, self.policy.timeout).await {
                Ok(info) => Some(info),
                Err(e) => {
                    tracing::debug!(%addr, error = %e, "no certificate");
                    None
                }
            }
        } else {
            None
        };

        tracing::debug!(%addr, banner = banner.is_some(), tls = certificate.is_some(), "tcp port open");

        ProbeOutcome::new(&self.host, port, Protocol::Tcp, PortStatus::Open)
            .with_banner(banner)
            .with_certificate(certificate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PortRange;
    use std::net::Ipv4Addr;
    use std::time::{Duration, Instant};
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    fn target(port: Port) -> ScanTarget {
        ScanTarget::new(
            "127.0.0.1",
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            PortRange::new(port, port).unwrap(),
        )
    }

    fn policy(enable_banner: bool) -> Arc<ProbeTimeoutPolicy> {
        Arc::new(ProbeTimeoutPolicy {
            timeout: Duration::from_secs(1),
            enable_banner,
            ..ProbeTimeoutPolicy::default()
        })
    }

    async fn closed_port() -> Port {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        Port::new(port).unwrap()
    }

    #[test]
    fn test_probe_creation() {
        let port = Port::new(80).unwrap();
        let probe = TcpProbe::new(&target(port), policy(false));
        assert_eq!(probe.target(), IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(probe.protocol(), Protocol::Tcp);
    }

    #[tokio::test]
    async fn test_closed_port() {
        let port = closed_port().await;
        let probe = TcpProbe::new(&target(port), policy(false));

        let start = Instant::now();
        let outcome = probe.probe(port).await;

        assert_eq!(outcome.status, PortStatus::Closed);
        assert_eq!(outcome.protocol, Protocol::Tcp);
        assert!(outcome.banner.is_none());
        assert!(start.elapsed() < Duration::from_millis(1500));
    }

    /// Listener whose accept queue is full, so new SYNs go unanswered.
    #[cfg(target_os = "linux")]
    async fn saturated_listener() -> (TcpListener, Vec<TcpStream>) {
        let socket = tokio::net::TcpSocket::new_v4().unwrap();
        socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let listener = socket.listen(1).unwrap();
        let addr = listener.local_addr().unwrap();

        let mut held = Vec::new();
        for _ in 0..4 {
            match timeout(Duration::from_millis(200), TcpStream::connect(addr)).await {
                Ok(Ok(stream)) => held.push(stream),
                _ => break,
            }
        }
        (listener, held)
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_unanswered_connect_times_out() {
        let (listener, held) = saturated_listener().await;
        assert!(!held.is_empty());
        let port = Port::new(listener.local_addr().unwrap().port()).unwrap();

        let policy = Arc::new(ProbeTimeoutPolicy {
            timeout: Duration::from_millis(300),
            ..ProbeTimeoutPolicy::default()
        });
        let probe = TcpProbe::new(&target(port), policy);
        let addr = SocketAddr::new(probe.target(), port.as_u16());

        let start = Instant::now();
        assert!(matches!(probe.attempt_connect(addr).await, Err(ProbeError::Timeout)));
        assert!(start.elapsed() >= Duration::from_millis(300));

        let start = Instant::now();
        let outcome = probe.probe(port).await;
        let elapsed = start.elapsed();
        assert_eq!(outcome.status, PortStatus::Closed);
        assert!(elapsed >= Duration::from_millis(300));
        assert!(elapsed < Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_open_port_with_banner() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = Port::new(listener.local_addr().unwrap().port()).unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(b"hello\n").await.unwrap();
        });

        let probe = TcpProbe::new(&target(port), policy(true));
        let outcome = probe.probe(port).await;

        assert_eq!(outcome.status, PortStatus::Open);
        assert_eq!(outcome.banner.as_deref(), Some("hello"));
        assert!(!outcome.is_tls);
        assert_eq!(outcome.host, "127.0.0.1");
    }

    #[tokio::test]
    async fn test_silent_service_is_open_without_banner() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = Port::new(listener.local_addr().unwrap().port()).unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(3)).await;
        });

        let probe = TcpProbe::new(&target(port), policy(true));
        let outcome = probe.probe(port).await;

        assert_eq!(outcome.status, PortStatus::Open);
        assert!(outcome.banner.is_none());
    }

    #[tokio::test]
    async fn test_failed_handshake_skips_certificate() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = Port::new(listener.local_addr().unwrap().port()).unwrap();
        tokio::spawn(async move {
            loop {
                let (mut socket, _) = listener.accept().await.unwrap();
                let _ = socket.write_all(b"plain text service\n").await;
            }
        });

        let policy = Arc::new(ProbeTimeoutPolicy {
            enable_tls: true,
            tls_ports: vec![port.as_u16()],
            ..ProbeTimeoutPolicy::default()
        });
        let outcome = TcpProbe::new(&target(port), policy).probe(port).await;

        assert_eq!(outcome.status, PortStatus::Open);
        assert!(!outcome.is_tls);
        assert!(outcome.certificate.is_none());
    }
}
