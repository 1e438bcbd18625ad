//! Command-line interface definitions for gatescan.
//!
//! Uses `clap` derive macros for declarative argument parsing. Flags that
//! are not given fall back to the settings file, then to built-in defaults.

use crate::config::{AppSettings, ScanConfig};
use crate::error::{ConfigError, ConfigResult};
use clap::Parser;
use std::path::PathBuf;

/// A concurrent TCP/UDP port scanner with banner grabbing and TLS
/// certificate inspection.
#[derive(Parser, Debug)]
#[command(name = "gatescan")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A concurrent TCP/UDP port scanner", long_about = None)]
pub struct Cli {
    /// Target IP address or hostname to scan
    #[arg(short = 'H', long, value_name = "HOST")]
    pub host: Option<String>,

    /// First port of the range
    #[arg(short, long, default_value = "1")]
    pub start: u32,

    /// Last port of the range
    #[arg(short, long, default_value = "1024")]
    pub end: u32,

    /// Number of concurrent workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Connection timeout in seconds
    #[arg(short, long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Pause each worker takes after every port, in milliseconds
    #[arg(short, long = "rate-limit", value_name = "MS")]
    pub rate_limit: Option<u64>,

    /// Read a banner from open TCP ports
    #[arg(long, overrides_with = "no_banners")]
    pub banners: bool,

    /// Do not read banners
    #[arg(long = "no-banners", overrides_with = "banners")]
    pub no_banners: bool,

    /// Inspect TLS certificates on TLS ports
    #[arg(long, overrides_with = "no_ssl")]
    pub ssl: bool,

    /// Do not inspect TLS certificates
    #[arg(long = "no-ssl", overrides_with = "ssl")]
    pub no_ssl: bool,

    /// Also probe every port over UDP
    #[arg(short, long)]
    pub udp: bool,

    /// Look up the target's geolocation
    #[arg(long, overrides_with = "no_geo")]
    pub geo: bool,

    /// Do not look up the target's geolocation
    #[arg(long = "no-geo", overrides_with = "geo")]
    pub no_geo: bool,

    /// Scan profile: aggressive, default or conservative
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Comma-separated nmap scripts to run against open TCP ports
    #[arg(long, value_name = "SCRIPTS", default_value = "")]
    pub nmap: String,

    /// Print one JSON object per result line
    #[arg(long)]
    pub json: bool,

    /// Print only host:port of open ports
    #[arg(short, long)]
    pub quiet: bool,

    /// Show certificate and location details and debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to a settings file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// List scan profiles and exit
    #[arg(long)]
    pub list_profiles: bool,

    /// List known nmap scripts and exit
    #[arg(long)]
    pub list_scripts: bool,
}

impl Cli {
    /// Load the settings file named by `--config`, or the default one.
    ///
    /// Without `--config`, a missing config directory means built-in
    /// defaults.
    pub fn load_settings(&self) -> ConfigResult<AppSettings> {
        match &self.config {
            Some(path) => AppSettings::load_from(path),
            None => match AppSettings::load() {
                Err(ConfigError::DirectoryNotFound) => {
                    tracing::debug!("no config directory, using default settings");
                    Ok(AppSettings::default())
                }
                other => other,
            },
        }
    }

    /// Layer the flags over `settings`.
    pub fn scan_config(&self, settings: &AppSettings) -> ConfigResult<ScanConfig> {
        let host = self.host.clone().ok_or(ConfigError::EmptyHost)?;
        let mut config = ScanConfig::from_settings(host, settings);

        config.start_port = self.start;
        config.end_port = self.end;
        if let Some(workers) = self.workers {
            config.max_workers = workers;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_seconds = timeout;
        }
        if let Some(rate_limit) = self.rate_limit {
            config.rate_limit_ms = rate_limit;
        }
        if let Some(on) = toggle(self.banners, self.no_banners) {
            config.banner_grabbing = on;
        }
        if let Some(on) = toggle(self.ssl, self.no_ssl) {
            config.enable_ssl = on;
        }
        if let Some(on) = toggle(self.geo, self.no_geo) {
            config.enable_geolocation = on;
        }
        config.enable_udp |= self.udp;
        config.profile = self.profile.clone();
        config.nmap_scripts = self.nmap.clone();

        Ok(config)
    }
}

/// `Some(true)` for `--x`, `Some(false)` for `--no-x`, `None` for neither.
fn toggle(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}
