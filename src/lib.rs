//! # gatescan - A Concurrent Port Scanner
//!
//! gatescan probes a contiguous port range on one host with a fixed pool of
//! async workers, optionally reading service banners and describing the TLS
//! certificates it is offered.
//!
//! ## Features
//!
//! - **Bounded concurrency**: at most `max_workers` tasks drain a port queue
//! - **Per-worker rate limiting**: a fixed pause after every consumed port
//! - **TCP and UDP probes**: connect scans, plus a connect-and-write UDP check
//! - **Banner grabbing**: first line sent by the service on open TCP ports
//! - **TLS inspection**: subject, issuer, validity, SANs, key size, fingerprint
//! - **Enrichment**: service names, IP geolocation and nmap scripts
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use gatescan::config::ScanConfig;
//! use gatescan::scanner::{run_scan, NoProgress};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ScanConfig {
//!         host: "127.0.0.1".to_string(),
//!         end_port: 1024,
//!         enable_geolocation: false,
//!         ..ScanConfig::default()
//!     };
//!     let report = run_scan(&config, Arc::new(NoProgress)).await?;
//!
//!     for outcome in report.open_outcomes() {
//!         println!("{}/{} is open", outcome.port, outcome.protocol);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Validated ports, port ranges and the scan target
//! - [`config`] - Scan configuration, profiles and the settings file
//! - [`scanner`] - Probes, the worker pool and result aggregation
//! - [`banner`] / [`certificate`] - Inspection of open TCP ports
//! - [`geolocation`] / [`scripts`] - Post-scan collaborators
//! - [`output`] - Text and JSON rendering
//! - [`error`] - Error types

pub mod banner;
pub mod certificate;
pub mod cli;
pub mod config;
pub mod error;
pub mod geolocation;
pub mod output;
pub mod scanner;
pub mod scripts;
pub mod services;
pub mod types;

// Re-export commonly used types
pub use config::{ProbeTimeoutPolicy, ScanConfig};
pub use error::{ConfigError, ScanError, TargetError};
pub use scanner::{
    run_scan, PortStatus, ProbeOutcome, Prober, Protocol, ScanEngine, ScanReport, ScanStatistics,
};
pub use types::{Port, PortRange, ScanTarget};
