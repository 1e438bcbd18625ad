//! JSON lines output formatting.

use crate::geolocation::GeoLocation;
use crate::scanner::{ProbeOutcome, ScanReport};
use crate::services::service_name;
use serde::Serialize;
use std::io::{self, Write};

/// One line of JSON output: the outcome plus report-level enrichment.
#[derive(Debug, Serialize)]
pub struct JsonLine<'a> {
    #[serde(flatten)]
    pub outcome: &'a ProbeOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geolocation: Option<&'a GeoLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<&'a str>,
}

impl<'a> JsonLine<'a> {
    pub fn new(outcome: &'a ProbeOutcome, geolocation: Option<&'a GeoLocation>) -> Self {
        Self {
            outcome,
            service: service_name(outcome.port.as_u16(), outcome.protocol),
            geolocation,
            severity: None,
        }
    }
}

/// Write every outcome of `report` as one JSON object per line.
pub fn write_json_lines<W: Write>(out: &mut W, report: &ScanReport) -> io::Result<()> {
    let geolocation = report.geolocation.as_ref();
    for outcome in &report.outcomes {
        serde_json::to_writer(&mut *out, &JsonLine::new(outcome, geolocation))?;
        writeln!(out)?;
    }
    Ok(())
}
