//! The immutable description of what a scan probes.
//!
//! A `ScanTarget` is built once from validated configuration: the host as
//! the user wrote it, the address it resolved to, and the port range.

use super::port::PortRange;
use crate::error::TargetError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

/// A host and port range, resolved to a single IP address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanTarget {
    /// The original input (hostname or IP string).
    pub host: String,
    /// The resolved IP address every probe connects to.
    pub ip: IpAddr,
    /// Ports to probe.
    pub range: PortRange,
}

impl ScanTarget {
    /// Create a target from an already-resolved address.
    pub fn new(host: impl Into<String>, ip: IpAddr, range: PortRange) -> Self {
        Self {
            host: host.into(),
            ip,
            range,
        }
    }

    /// Resolve `host` and build a target for `range`.
    ///
    /// IP literals are used as-is; hostnames go through DNS and the first
    /// address returned is kept.
    pub async fn resolve(host: &str, range: PortRange) -> Result<Self, TargetError> {
        let host = host.trim();
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(Self::new(host, ip, range));
        }

        let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());

        let response = resolver
            .lookup_ip(host)
            .await
            .map_err(|e| TargetError::DnsResolutionFailed(host.to_string(), e.to_string()))?;

        let ip = response
            .iter()
            .next()
            .ok_or_else(|| TargetError::NoAddressesFound(host.to_string()))?;

        tracing::debug!(host, %ip, "resolved target");
        Ok(Self::new(host, ip, range))
    }
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host == self.ip.to_string() {
            write!(f, "{}", self.ip)
        } else {
            write!(f, "{} ({})", self.host, self.ip)
        }
    }
}
