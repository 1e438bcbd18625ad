//! Plain text output formatting.
//!
//! Produces human-readable output with colors and formatting.

use crate::certificate::CertificateInfo;
use crate::geolocation::GeoLocation;
use crate::scanner::{PortStatus, ProbeOutcome, ScanReport, ScanStatistics};
use crate::scripts::{ScriptResult, ScriptStatus};
use crate::services::service_name;
use console::{style, Style};
use std::io::{self, Write};

const RULE: &str = "───────────────────────────────────────────────────────────────";

/// Write the report: open ports, optional details, then statistics.
pub fn write_plain<W: Write>(out: &mut W, report: &ScanReport, verbose: bool) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "  {} {}", style("Target:").bold(), report.target)?;
    writeln!(
        out,
        "  {} {}s per probe",
        style("Timeout:").bold(),
        report.policy_timeout_seconds
    )?;
    writeln!(out, "  {}", style(RULE).dim())?;

    let open: Vec<&ProbeOutcome> = report.open_outcomes().collect();
    if open.is_empty() {
        writeln!(out, "  {}", style("No open ports found.").dim())?;
    }

    for outcome in open {
        write_outcome(out, outcome)?;
        if verbose {
            if let Some(cert) = &outcome.certificate {
                write_certificate(out, cert)?;
            }
        }
    }
    writeln!(out, "  {}", style(RULE).dim())?;

    if !report.scripts.is_empty() {
        write_scripts(out, &report.scripts, verbose)?;
    }

    if verbose {
        if let Some(geo) = &report.geolocation {
            write_geolocation(out, geo)?;
        }
    }

    write_statistics(out, &report.statistics)
}

/// Write `host:port` for each open port, nothing else.
pub fn write_quiet<W: Write>(out: &mut W, report: &ScanReport) -> io::Result<()> {
    for outcome in report.open_outcomes() {
        writeln!(out, "{}:{}", outcome.host, outcome.port)?;
    }
    Ok(())
}

fn write_outcome<W: Write>(out: &mut W, outcome: &ProbeOutcome) -> io::Result<()> {
    let (glyph, glyph_style) = match outcome.status {
        PortStatus::Open => ("✓", Style::new().green().bold()),
        PortStatus::Filtered => ("~", Style::new().yellow()),
        PortStatus::Closed => ("✗", Style::new().red()),
    };

    let mut line = format!(
        "  {} {}",
        glyph_style.apply_to(glyph),
        style(format!("{}:{}/{}", outcome.host, outcome.port, outcome.protocol)).bold()
    );

    if let Some(service) = service_name(outcome.port.as_u16(), outcome.protocol) {
        line.push_str(&format!("  {}", style(service).cyan()));
    }
    if let Some(banner) = &outcome.banner {
        line.push_str(&format!("  {}", style(truncate_string(banner, 50)).dim()));
    }
    if outcome.is_tls {
        line.push_str(&format!(" {}", style("[HTTPS]").magenta()));
    }

    writeln!(out, "{}", line)
}

fn write_certificate<W: Write>(out: &mut W, cert: &CertificateInfo) -> io::Result<()> {
    let label = |s: &'static str| style(s).dim();

    writeln!(out, "      {} {}", label("Subject:"), cert.subject)?;
    writeln!(out, "      {} {}", label("Issuer:"), cert.issuer)?;
    writeln!(
        out,
        "      {} {} to {}",
        label("Valid:"),
        cert.valid_from.format("%Y-%m-%d"),
        cert.valid_to.format("%Y-%m-%d")
    )?;
    if cert.is_expired {
        writeln!(out, "      {}", style("Certificate has expired").red().bold())?;
    }
    if !cert.dns_names.is_empty() {
        writeln!(out, "      {} {}", label("DNS names:"), cert.dns_names.join(", "))?;
    }
    writeln!(
        out,
        "      {} {} ({} bits)",
        label("Key:"),
        cert.signature_algorithm,
        cert.public_key_bits
    )?;
    writeln!(out, "      {} {}", label("SHA-256:"), cert.fingerprint_sha256)
}

fn write_scripts<W: Write>(out: &mut W, results: &[ScriptResult], verbose: bool) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "  {}", style("Scripts:").bold())?;
    for result in results {
        let status = match result.status {
            ScriptStatus::Success => style("ok").green(),
            ScriptStatus::Error => style("error").red(),
        };
        write!(
            out,
            "    {} {}/{} {} ({}ms)",
            result.script, result.port, result.protocol, status, result.duration_ms
        )?;
        match &result.error {
            Some(error) => writeln!(out, ": {}", error)?,
            None => writeln!(out)?,
        }
        if verbose && !result.output.is_empty() {
            for line in result.output.lines() {
                writeln!(out, "      {}", style(line).dim())?;
            }
        }
    }
    Ok(())
}

fn write_geolocation<W: Write>(out: &mut W, geo: &GeoLocation) -> io::Result<()> {
    writeln!(out)?;
    match &geo.error {
        Some(error) => writeln!(
            out,
            "  {} {}",
            style("Location:").bold(),
            style(format!("unavailable ({})", error)).dim()
        ),
        None => {
            let place: Vec<&str> = [geo.city.as_str(), geo.region.as_str(), geo.country.as_str()]
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect();
            writeln!(out, "  {} {}", style("Location:").bold(), place.join(", "))?;
            writeln!(out, "            {:.4}, {:.4}", geo.latitude, geo.longitude)?;
            if !geo.isp.is_empty() {
                writeln!(out, "  {} {}", style("ISP:").bold(), geo.isp)?;
            }
            Ok(())
        }
    }
}

fn write_statistics<W: Write>(out: &mut W, stats: &ScanStatistics) -> io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "  {} {} ports scanned in {:.2}s ({:.1} ports/s)",
        style("Statistics:").bold(),
        stats.total_ports,
        stats.duration_seconds,
        stats.ports_per_second
    )?;
    writeln!(
        out,
        "              {} open, {} closed, {} filtered",
        style(stats.open_ports).green().bold(),
        style(stats.closed_ports).red(),
        style(stats.filtered_ports).yellow()
    )?;
    writeln!(out)
}

/// Print a scan header before scanning begins.
pub fn print_scan_header(host: &str, ports: usize, workers: usize) {
    eprintln!();
    eprintln!(
        "{} {} v{}",
        style("Starting").cyan(),
        style("gatescan").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    eprintln!("{} Target: {}", style("•").dim(), style(host).white().bold());
    eprintln!(
        "{} Scanning {} ports with {} workers...",
        style("•").dim(),
        style(ports).white().bold(),
        workers
    );
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Truncate to at most `max_chars` characters, adding an ellipsis if cut.
fn truncate_string(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
