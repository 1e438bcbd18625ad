//! External nmap script execution.
//!
//! Runs `nmap --script=<name>` against a single port. The scan never
//! depends on the result; failures are recorded on the result itself.

use crate::scanner::Protocol;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::sync::OnceCell;
use tokio::time::timeout;

/// Extra time granted to nmap on top of the probe timeout.
const SCRIPT_GRACE: Duration = Duration::from_secs(5);

/// Commonly used nmap scripts and what they do.
pub const KNOWN_SCRIPTS: &[(&str, &str)] = &[
    ("banner", "Grabs service banner"),
    ("ftp-anon", "Checks for anonymous FTP"),
    ("http-methods", "Finds supported HTTP methods"),
    ("http-title", "Grabs HTTP page title"),
    ("mongodb-info", "Gets MongoDB info"),
    ("mysql-info", "Gets MySQL server info"),
    ("redis-info", "Gets Redis server info"),
    ("smb-enum-shares", "Enumerates SMB shares"),
    ("smb-os-discovery", "Detects SMB OS"),
    ("ssh-hostkey", "Grabs SSH host keys"),
    ("ssl-cert", "Retrieves SSL certificate info"),
    ("ssl-enum-ciphers", "Enumerates SSL ciphers"),
];

/// Whether `script` is in the catalogue of known scripts.
pub fn is_known_script(script: &str) -> bool {
    KNOWN_SCRIPTS.iter().any(|(name, _)| *name == script)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptStatus {
    Success,
    Error,
}

/// Outcome of one script run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptResult {
    pub script: String,
    pub port: u16,
    pub protocol: Protocol,
    pub output: String,
    pub status: ScriptStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// Invokes the nmap binary.
///
/// The availability check runs once per runner and is cached.
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    nmap_path: String,
    available: OnceCell<bool>,
}

impl ScriptRunner {
    pub fn new() -> Self {
        Self::with_binary("nmap")
    }

    pub fn with_binary(nmap_path: impl Into<String>) -> Self {
        Self {
            nmap_path: nmap_path.into(),
            available: OnceCell::new(),
        }
    }

    /// Check whether the binary can be executed.
    pub async fn is_available(&self) -> bool {
        *self
            .available
            .get_or_init(|| async {
                Command::new(&self.nmap_path)
                    .arg("-V")
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .status()
                    .await
                    .map(|status| status.success())
                    .unwrap_or(false)
            })
            .await
    }

    /// Run `script` against `host:port/protocol`.
    pub async fn run(
        &self,
        host: &str,
        port: u16,
        protocol: Protocol,
        script: &str,
        probe_timeout: Duration,
    ) -> ScriptResult {
        let start = Instant::now();
        let outcome = self.execute(host, port, protocol, script, probe_timeout).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let (output, status, error) = match outcome {
            Ok(output) => (output, ScriptStatus::Success, None),
            Err(e) => {
                tracing::warn!(script, port, error = %e, "script failed");
                (String::new(), ScriptStatus::Error, Some(e))
            }
        };

        ScriptResult {
            script: script.to_string(),
            port,
            protocol,
            output,
            status,
            error,
            duration_ms,
        }
    }

    /// Run each of `scripts` in turn against one port.
    pub async fn run_many(
        &self,
        host: &str,
        port: u16,
        protocol: Protocol,
        scripts: &[String],
        probe_timeout: Duration,
    ) -> Vec<ScriptResult> {
        let mut results = Vec::with_capacity(scripts.len());
        for script in scripts {
            results.push(self.run(host, port, protocol, script, probe_timeout).await);
        }
        results
    }

    async fn execute(
        &self,
        host: &str,
        port: u16,
        protocol: Protocol,
        script: &str,
        probe_timeout: Duration,
    ) -> Result<String, String> {
        if !self.is_available().await {
            return Err("nmap not installed".to_string());
        }

        let args = [
            "-p".to_string(),
            format!("{}/{}", port, protocol),
            "-sV".to_string(),
            format!("--script={}", script),
            host.to_string(),
        ];
        tracing::debug!(?args, "executing nmap");

        let mut cmd = Command::new(&self.nmap_path);
        cmd.args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = timeout(probe_timeout + SCRIPT_GRACE, cmd.output())
            .await
            .map_err(|_| "nmap execution timed out".to_string())?
            .map_err(|e| format!("failed to execute nmap: {}", e))?;

        if !output.status.success() {
            return Err(format!("command failed: {}", output.status));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl Default for ScriptRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue() {
        assert!(is_known_script("ssh-hostkey"));
        assert!(is_known_script("ssl-cert"));
        assert!(!is_known_script("rm-rf"));
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let runner = ScriptRunner::with_binary("/nonexistent/gatescan-nmap");
        assert!(!runner.is_available().await);

        let result = runner
            .run("127.0.0.1", 22, Protocol::Tcp, "ssh-hostkey", Duration::from_secs(1))
            .await;
        assert_eq!(result.status, ScriptStatus::Error);
        assert_eq!(result.error.as_deref(), Some("nmap not installed"));
        assert_eq!(result.script, "ssh-hostkey");
        assert!(result.output.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_line_shape() {
        // `echo` accepts any arguments and prints them back.
        let runner = ScriptRunner::with_binary("echo");
        let results = runner
            .run_many(
                "10.0.0.5",
                53,
                Protocol::Udp,
                &["banner".to_string(), "http-title".to_string()],
                Duration::from_secs(1),
            )
            .await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].status, ScriptStatus::Success);
        assert_eq!(results[0].output.trim(), "-p 53/udp -sV --script=banner 10.0.0.5");
        assert_eq!(results[1].output.trim(), "-p 53/udp -sV --script=http-title 10.0.0.5");
    }

    /// Write an executable stand-in for nmap that logs each invocation.
    #[cfg(unix)]
    fn logging_binary(dir: &std::path::Path) -> (String, std::path::PathBuf) {
        use std::os::unix::fs::PermissionsExt;

        let log = dir.join("calls.log");
        let bin = dir.join("fake-nmap");
        std::fs::write(
            &bin,
            format!("#!/bin/sh\necho \"$@\" >> '{}'\necho done\n", log.display()),
        )
        .unwrap();
        std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755)).unwrap();
        (bin.display().to_string(), log)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_availability_checked_once() {
        let dir = tempfile::tempdir().unwrap();
        let (bin, log) = logging_binary(dir.path());
        let runner = ScriptRunner::with_binary(bin);
        let scripts: Vec<String> = ["banner", "http-title", "ssl-cert"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        for port in [80, 443] {
            let results = runner
                .run_many("127.0.0.1", port, Protocol::Tcp, &scripts, Duration::from_secs(1))
                .await;
            assert!(results.iter().all(|r| r.status == ScriptStatus::Success));
        }
        assert!(runner.is_available().await);

        let calls = std::fs::read_to_string(&log).unwrap();
        let calls: Vec<&str> = calls.lines().collect();
        assert_eq!(calls.len(), 7);
        assert_eq!(calls.iter().filter(|line| **line == "-V").count(), 1);
        assert_eq!(calls[0], "-V");
    }
}
