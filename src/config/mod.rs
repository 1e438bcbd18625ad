//! Configuration management for Gatescan.
//!
//! `ScanConfig` is the raw, user-facing configuration. Validating it yields
//! the port range and the `ProbeTimeoutPolicy` every other component reads.

mod profiles;
mod settings;

pub use profiles::{Profile, ProfilePreset};
pub use settings::{AppSettings, Paths};

use crate::error::{ConfigError, ConfigResult};
use crate::types::{Port, PortRange};
use std::time::Duration;

/// Deadline for the single banner read on an open TCP port.
pub const BANNER_TIMEOUT: Duration = Duration::from_secs(1);

/// Unvalidated scan configuration, as assembled from flags and settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    pub host: String,
    pub start_port: u32,
    pub end_port: u32,
    pub max_workers: usize,
    pub timeout_seconds: u64,
    pub rate_limit_ms: u64,
    pub banner_grabbing: bool,
    pub enable_ssl: bool,
    pub enable_udp: bool,
    pub enable_geolocation: bool,
    pub profile: Option<String>,
    /// Comma-separated script names.
    pub nmap_scripts: String,
    pub tls_ports: Vec<u16>,
}

impl ScanConfig {
    /// Build a configuration for `host` seeded from stored settings.
    pub fn from_settings(host: impl Into<String>, settings: &AppSettings) -> Self {
        Self {
            host: host.into(),
            start_port: 1,
            end_port: 1024,
            max_workers: settings.workers,
            timeout_seconds: settings.timeout_seconds,
            rate_limit_ms: settings.rate_limit_ms,
            banner_grabbing: settings.banner_grabbing,
            enable_ssl: settings.enable_ssl,
            enable_udp: settings.enable_udp,
            enable_geolocation: settings.enable_geolocation,
            profile: None,
            nmap_scripts: String::new(),
            tls_ports: settings.tls_ports.clone(),
        }
    }

    /// Validate the configuration and compute the effective policy.
    ///
    /// A timeout below one second is raised to one second. A named profile
    /// then replaces the worker count, timeout and rate limit with its
    /// preset, keeping the preset's millisecond precision.
    pub fn validate(&self) -> ConfigResult<(PortRange, ProbeTimeoutPolicy)> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }

        let start = Port::try_from(self.start_port).map_err(|_| ConfigError::PortOutOfRange {
            field: "start port",
            value: self.start_port,
        })?;
        let end = Port::try_from(self.end_port).map_err(|_| ConfigError::PortOutOfRange {
            field: "end port",
            value: self.end_port,
        })?;
        let range = PortRange::new(start, end).map_err(|_| ConfigError::InvalidPortOrder {
            start: start.as_u16(),
            end: end.as_u16(),
        })?;

        if self.max_workers < 1 {
            return Err(ConfigError::InvalidWorkers(self.max_workers));
        }

        let mut policy = ProbeTimeoutPolicy {
            timeout: Duration::from_secs(self.timeout_seconds.max(1)),
            max_workers: self.max_workers,
            rate_limit: Duration::from_millis(self.rate_limit_ms),
            banner_timeout: BANNER_TIMEOUT,
            enable_banner: self.banner_grabbing,
            enable_tls: self.enable_ssl,
            enable_udp: self.enable_udp,
            tls_ports: self.tls_ports.clone(),
        };

        if let Some(name) = &self.profile {
            let profile: Profile = name.parse()?;
            policy.apply(profile.preset());
            tracing::debug!(%profile, ?policy, "applied profile preset");
        }

        Ok((range, policy))
    }

    /// Script names from the comma-separated list, trimmed, blanks removed.
    pub fn script_list(&self) -> Vec<String> {
        self.nmap_scripts
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::from_settings("", &AppSettings::default())
    }
}

/// Effective timing and feature settings, read-only for the whole scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTimeoutPolicy {
    /// Connect (TCP) or setup-and-write (UDP) deadline per probe.
    pub timeout: Duration,
    pub max_workers: usize,
    /// Pause each worker takes after every port it consumes.
    pub rate_limit: Duration,
    pub banner_timeout: Duration,
    pub enable_banner: bool,
    pub enable_tls: bool,
    pub enable_udp: bool,
    pub tls_ports: Vec<u16>,
}

impl ProbeTimeoutPolicy {
    fn apply(&mut self, preset: ProfilePreset) {
        self.max_workers = preset.workers;
        self.timeout = preset.timeout;
        self.rate_limit = preset.rate_limit;
    }

    /// The timeout in whole seconds, rounded up, for display.
    pub fn timeout_seconds(&self) -> u64 {
        let secs = self.timeout.as_secs();
        if self.timeout.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }

    /// Whether a TLS handshake should follow an open connection on `port`.
    pub fn tls_applies(&self, port: u16) -> bool {
        self.enable_tls && self.tls_ports.contains(&port)
    }
}

impl Default for ProbeTimeoutPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(1),
            max_workers: 100,
            rate_limit: Duration::ZERO,
            banner_timeout: BANNER_TIMEOUT,
            enable_banner: false,
            enable_tls: false,
            enable_udp: false,
            tls_ports: vec![443, 8443],
        }
    }
}
