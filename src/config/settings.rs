//! Settings file layer.
//!
//! Defaults for the command-line flags can be stored as JSON, either at an
//! explicit path or in the XDG configuration directory.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application directory paths following the XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/gatescan)
    pub config_dir: PathBuf,
}

impl Paths {
    pub fn new() -> ConfigResult<Self> {
        let project =
            ProjectDirs::from("com", "gatescan", "gatescan").ok_or(ConfigError::DirectoryNotFound)?;

        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// Stored defaults for a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub workers: usize,
    pub timeout_seconds: u64,
    pub rate_limit_ms: u64,
    pub banner_grabbing: bool,
    pub enable_ssl: bool,
    pub enable_udp: bool,
    pub enable_geolocation: bool,
    /// Ports on which an open TCP connection is followed by a TLS handshake.
    pub tls_ports: Vec<u16>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            workers: 100,
            timeout_seconds: 1,
            rate_limit_ms: 10,
            banner_grabbing: true,
            enable_ssl: true,
            enable_udp: false,
            enable_geolocation: true,
            tls_ports: vec![443, 8443],
        }
    }
}

impl AppSettings {
    /// Load settings from the XDG location, falling back to defaults when
    /// no file exists there.
    pub fn load() -> ConfigResult<Self> {
        let file = Paths::new()?.settings_file();

        if !file.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();
        assert_eq!(settings.workers, 100);
        assert_eq!(settings.timeout_seconds, 1);
        assert_eq!(settings.tls_ports, vec![443, 8443]);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"workers": 8, "enable_udp": true}}"#).unwrap();

        let settings = AppSettings::load_from(file.path()).unwrap();
        assert_eq!(settings.workers, 8);
        assert!(settings.enable_udp);
        assert_eq!(settings.rate_limit_ms, 10);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "workers = 8").unwrap();

        assert!(matches!(
            AppSettings::load_from(file.path()),
            Err(ConfigError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(
            AppSettings::load_from(&missing),
            Err(ConfigError::ReadFailed { .. })
        ));
    }
}
