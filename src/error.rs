//! Error types for Gatescan.
//!
//! Uses `thiserror` for ergonomic error definitions. Only configuration and
//! target errors ever reach the caller of a scan; probe errors are folded into
//! port status or dropped optional fields.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while validating or loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("host cannot be empty")]
    EmptyHost,

    #[error("{field} must be between 1 and 65535 (got {value})")]
    PortOutOfRange { field: &'static str, value: u32 },

    #[error("end port ({end}) must be greater than or equal to start port ({start})")]
    InvalidPortOrder { start: u16, end: u16 },

    #[error("workers must be at least 1 (got {0})")]
    InvalidWorkers(usize),

    #[error("unknown profile '{0}' (expected aggressive, default or conservative)")]
    UnknownProfile(String),

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("invalid settings format: {0}")]
    InvalidFormat(String),

    #[error("could not determine configuration directory")]
    DirectoryNotFound,
}

/// Errors raised while turning a host string into a scan target.
#[derive(Error, Debug)]
pub enum TargetError {
    #[error("failed to resolve hostname '{0}': {1}")]
    DnsResolutionFailed(String, String),

    #[error("no IP addresses found for hostname '{0}'")]
    NoAddressesFound(String),
}

/// Failure of a single probe step.
///
/// Never escapes the probes: a failed connect becomes a status, a failed
/// banner read or handshake becomes a missing field.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("connection timed out")]
    Timeout,

    #[error("connection refused")]
    ConnectionRefused,

    #[error("host unreachable")]
    HostUnreachable,

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("TLS handshake failed: {0}")]
    Tls(String),

    #[error("certificate parse failed: {0}")]
    Certificate(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProbeError {
    /// Classify an I/O error returned by `connect`.
    pub fn from_connect(err: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match err.kind() {
            ErrorKind::ConnectionRefused => Self::ConnectionRefused,
            ErrorKind::TimedOut => Self::Timeout,
            _ => {
                let text = err.to_string().to_lowercase();
                if text.contains("unreachable") {
                    if text.contains("host") {
                        Self::HostUnreachable
                    } else {
                        Self::NetworkUnreachable(err.to_string())
                    }
                } else {
                    Self::ConnectionFailed(err.to_string())
                }
            }
        }
    }
}

/// Errors that abort a scan before any worker starts.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("target error: {0}")]
    Target(#[from] TargetError),
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type alias for probe steps.
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Result type alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_connect_error_classification() {
        let refused = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        assert!(matches!(
            ProbeError::from_connect(refused),
            ProbeError::ConnectionRefused
        ));

        let timed_out = io::Error::new(io::ErrorKind::TimedOut, "timed out");
        assert!(matches!(ProbeError::from_connect(timed_out), ProbeError::Timeout));

        let host = io::Error::new(io::ErrorKind::Other, "No route to host: host unreachable");
        assert!(matches!(
            ProbeError::from_connect(host),
            ProbeError::HostUnreachable
        ));
    }

    #[test]
    fn test_config_error_messages() {
        let err = ConfigError::PortOutOfRange {
            field: "start port",
            value: 70000,
        };
        assert_eq!(err.to_string(), "start port must be between 1 and 65535 (got 70000)");

        let err = ScanError::from(ConfigError::EmptyHost);
        assert_eq!(err.to_string(), "configuration error: host cannot be empty");
    }
}
