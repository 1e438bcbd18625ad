//! Result ordering and scan statistics.

use super::traits::{PortStatus, ProbeOutcome, Protocol};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Durations shorter than this are treated as zero when computing a rate.
const MIN_RATE_WINDOW: Duration = Duration::from_micros(1);

/// Summary of a finished scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanStatistics {
    pub target_host: String,
    /// Size of the configured port range, regardless of protocol.
    pub total_ports: usize,
    /// Open, closed and filtered count TCP outcomes only.
    pub open_ports: usize,
    pub closed_ports: usize,
    pub filtered_ports: usize,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_seconds: f64,
    pub ports_per_second: f64,
}

/// Collects the clock at scan start and turns the drained outcome set into
/// an ordered result sequence plus statistics.
#[derive(Debug)]
pub struct ResultAggregator {
    target_host: String,
    total_ports: usize,
    started_at: DateTime<Utc>,
    started: Instant,
}

impl ResultAggregator {
    /// Start the clock for a scan of `total_ports` ports.
    pub fn start(target_host: impl Into<String>, total_ports: usize) -> Self {
        Self {
            target_host: target_host.into(),
            total_ports,
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }

    /// Order `outcomes` and compute statistics. Call only once every worker
    /// has finished.
    pub fn finish(self, mut outcomes: Vec<ProbeOutcome>) -> (Vec<ProbeOutcome>, ScanStatistics) {
        sort_outcomes(&mut outcomes);

        let elapsed = self.started.elapsed();
        let end_time = self.started_at
            + chrono::Duration::from_std(elapsed).unwrap_or_else(|_| chrono::Duration::zero());

        let stats = statistics(
            &self.target_host,
            &outcomes,
            self.total_ports,
            self.started_at,
            end_time,
            elapsed,
        );
        (outcomes, stats)
    }
}

/// Sort by port ascending, then protocol (`tcp` before `udp`).
pub fn sort_outcomes(outcomes: &mut [ProbeOutcome]) {
    outcomes.sort_by_key(|o| (o.port, o.protocol));
}

fn statistics(
    target_host: &str,
    outcomes: &[ProbeOutcome],
    total_ports: usize,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    elapsed: Duration,
) -> ScanStatistics {
    let count = |status: PortStatus| {
        outcomes
            .iter()
            .filter(|o| o.protocol == Protocol::Tcp && o.status == status)
            .count()
    };

    let duration_seconds = elapsed.as_secs_f64();
    let ports_per_second = if elapsed < MIN_RATE_WINDOW {
        0.0
    } else {
        total_ports as f64 / duration_seconds
    };

    ScanStatistics {
        target_host: target_host.to_string(),
        total_ports,
        open_ports: count(PortStatus::Open),
        closed_ports: count(PortStatus::Closed),
        filtered_ports: count(PortStatus::Filtered),
        start_time,
        end_time,
        duration_seconds,
        ports_per_second,
    }
}
