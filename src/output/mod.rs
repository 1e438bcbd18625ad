//! Output formatting module.
//!
//! Renders a finished `ScanReport` as human-readable text or as JSON lines,
//! and provides the progress bar shown while a scan runs.

mod json_format;
mod plain;
mod progress;

pub use json_format::{write_json_lines, JsonLine};
pub use plain::{print_error, print_scan_header, print_warning, write_plain, write_quiet};
pub use progress::ProgressBarSink;

use crate::scanner::ScanReport;
use std::io;

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text; `verbose` adds certificate and location details.
    #[default]
    Plain,
    /// Only `host:port` of each open port.
    Quiet,
    /// One JSON object per outcome per line.
    Json,
}

impl OutputFormat {
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if json {
            Self::Json
        } else if quiet {
            Self::Quiet
        } else {
            Self::Plain
        }
    }

    /// Whether decorations such as the header and progress bar may be shown.
    pub fn is_interactive(self) -> bool {
        self == Self::Plain
    }
}

/// Print `report` to stdout in `format`.
pub fn print_report(report: &ScanReport, format: OutputFormat, verbose: bool) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Plain => write_plain(&mut out, report, verbose),
        OutputFormat::Quiet => write_quiet(&mut out, report),
        OutputFormat::Json => write_json_lines(&mut out, report),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::scanner::{PortStatus, ProbeOutcome, Protocol, ResultAggregator, ScanReport};
    use crate::types::{Port, PortRange, ScanTarget};
    use std::net::{IpAddr, Ipv4Addr};

    /// A small report: 22/tcp open with a banner, 23/tcp closed, 53/udp open.
    pub fn report() -> ScanReport {
        let host = "10.0.0.5";
        let outcomes = vec![
            ProbeOutcome::new(host, Port::new(22).unwrap(), Protocol::Tcp, PortStatus::Open)
                .with_banner(Some("SSH-2.0-OpenSSH_9.6".to_string())),
            ProbeOutcome::new(host, Port::new(23).unwrap(), Protocol::Tcp, PortStatus::Closed),
            ProbeOutcome::new(host, Port::new(53).unwrap(), Protocol::Udp, PortStatus::Open),
        ];
        let (outcomes, statistics) = ResultAggregator::start(host, 2).finish(outcomes);

        ScanReport {
            target: ScanTarget::new(
                host,
                IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)),
                PortRange::new(Port::new(22).unwrap(), Port::new(23).unwrap()).unwrap(),
            ),
            policy_timeout_seconds: 1,
            outcomes,
            statistics,
            geolocation: None,
            scripts: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Plain);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Json);
        assert!(OutputFormat::Plain.is_interactive());
        assert!(!OutputFormat::Json.is_interactive());
    }
}
