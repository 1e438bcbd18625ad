//! Prober trait abstraction and the outcome types it produces.
//!
//! Defines a common interface for the TCP and UDP probes so the engine can
//! drive either one per port.

use crate::certificate::CertificateInfo;
use crate::types::Port;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Transport protocol of a probe. Orders `tcp` before `udp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a probed port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortStatus {
    /// TCP: handshake completed. UDP: socket setup and write succeeded.
    Open,
    /// The probe failed, whether refused, timed out or unreachable.
    Closed,
    /// No response at all. The connect probes never produce this; it is
    /// kept so the statistics stay complete.
    Filtered,
}

impl fmt::Display for PortStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Filtered => write!(f, "filtered"),
        }
    }
}

/// Result of probing one port over one protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub host: String,
    pub port: Port,
    pub protocol: Protocol,
    pub status: PortStatus,
    /// First line the service sent, without the line terminator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
    #[serde(rename = "is_ssl")]
    pub is_tls: bool,
    #[serde(rename = "ssl_info", skip_serializing_if = "Option::is_none")]
    pub certificate: Option<CertificateInfo>,
}

impl ProbeOutcome {
    pub fn new(host: impl Into<String>, port: Port, protocol: Protocol, status: PortStatus) -> Self {
        Self {
            host: host.into(),
            port,
            protocol,
            status,
            banner: None,
            is_tls: false,
            certificate: None,
        }
    }

    pub fn with_banner(mut self, banner: Option<String>) -> Self {
        self.banner = banner;
        self
    }

    /// Attach a certificate; marks the outcome as TLS when one is present.
    pub fn with_certificate(mut self, certificate: Option<CertificateInfo>) -> Self {
        self.is_tls = certificate.is_some();
        self.certificate = certificate;
        self
    }

    pub fn is_open(&self) -> bool {
        self.status == PortStatus::Open
    }
}

/// A single-port probe.
///
/// Implementations never fail: every network error is folded into the
/// returned outcome's status.
#[async_trait]
pub trait Prober: Send + Sync {
    fn protocol(&self) -> Protocol;

    /// Probe one port of the target.
    async fn probe(&self, port: Port) -> ProbeOutcome;

    fn target(&self) -> IpAddr;
}
