//! Scanner module - coordinates the probing of a port range.
//!
//! A single feeder pushes `start..=end` into a bounded FIFO queue sized to
//! the worker count. Up to `max_workers` tasks (never more than there are
//! ports) drain it; each claims one port per dequeue, runs the TCP probe
//! (and the UDP probe when enabled), submits the outcomes to an unbounded
//! collector and then pauses for the rate-limit interval. Outcomes are ordered only once the pool has drained.

pub mod aggregate;
pub mod rate_limiter;
pub mod tcp;
pub mod traits;
pub mod udp;

pub use aggregate::{sort_outcomes, ResultAggregator, ScanStatistics};
pub use rate_limiter::RateLimiter;
pub use tcp::TcpProbe;
pub use traits::{PortStatus, ProbeOutcome, Prober, Protocol};
pub use udp::UdpProbe;

use crate::config::{ProbeTimeoutPolicy, ScanConfig};
use crate::error::ScanResult;
use crate::geolocation::{GeoLocation, GeoLocator};
use crate::scripts::{is_known_script, ScriptResult, ScriptRunner};
use crate::types::{Port, ScanTarget};
use futures::StreamExt;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

/// Progress is reported after every this many completed ports.
pub const PROGRESS_INTERVAL: usize = 10;

/// Receives advisory `(completed, total)` notifications.
///
/// Called from worker tasks; implementations must return promptly and must
/// not block.
pub trait ProgressSink: Send + Sync {
    fn report(&self, completed: usize, total: usize);
}

/// A sink that discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _completed: usize, _total: usize) {}
}

/// Runs the worker pool over one target.
pub struct ScanEngine {
    target: ScanTarget,
    policy: Arc<ProbeTimeoutPolicy>,
    progress: Arc<dyn ProgressSink>,
}

impl ScanEngine {
    pub fn new(target: ScanTarget, policy: ProbeTimeoutPolicy) -> Self {
        Self {
            target,
            policy: Arc::new(policy),
            progress: Arc::new(NoProgress),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn target(&self) -> &ScanTarget {
        &self.target
    }

    pub fn policy(&self) -> &ProbeTimeoutPolicy {
        &self.policy
    }

    /// Number of worker tasks: `max_workers`, capped at the number of ports
    /// since a surplus worker could never claim one.
    pub fn pool_size(&self) -> usize {
        self.policy.max_workers.clamp(1, self.target.range.len())
    }

    /// Probe every port of the range and return the ordered outcomes and
    /// statistics.
    ///
    /// Returns only once every port has one TCP outcome (and one UDP
    /// outcome when enabled). Probe failures never abort the scan.
    pub async fn run(&self) -> (Vec<ProbeOutcome>, ScanStatistics) {
        let total = self.target.range.len();
        let workers = self.pool_size();
        let aggregator = ResultAggregator::start(&self.target.host, total);

        tracing::info!(
            host = %self.target,
            range = %self.target.range,
            workers,
            timeout_ms = self.policy.timeout.as_millis() as u64,
            rate_limit_ms = self.policy.rate_limit.as_millis() as u64,
            "starting scan"
        );

        let (port_tx, port_rx) = mpsc::channel::<Port>(workers);
        let port_rx = Arc::new(Mutex::new(port_rx));
        let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel::<ProbeOutcome>();
        let completed = Arc::new(AtomicUsize::new(0));

        let range = self.target.range;
        let feeder = tokio::spawn(async move {
            for port in range.iter() {
                if port_tx.send(port).await.is_err() {
                    break;
                }
            }
        });

        let tcp: Arc<dyn Prober> = Arc::new(TcpProbe::new(&self.target, Arc::clone(&self.policy)));
        let udp: Option<Arc<dyn Prober>> = if self.policy.enable_udp {
            Some(Arc::new(UdpProbe::new(&self.target, Arc::clone(&self.policy))))
        } else {
            None
        };
        let limiter = RateLimiter::new(self.policy.rate_limit);

        let mut pool = JoinSet::new();
        for _ in 0..workers {
            let worker = Worker {
                ports: Arc::clone(&port_rx),
                outcomes: outcome_tx.clone(),
                tcp: Arc::clone(&tcp),
                udp: udp.clone(),
                limiter,
                completed: Arc::clone(&completed),
                total,
                progress: Arc::clone(&self.progress),
            };
            pool.spawn(worker.run());
        }
        drop(outcome_tx);

        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "scan worker failed");
            }
        }
        if let Err(e) = feeder.await {
            tracing::error!(error = %e, "port feeder failed");
        }

        let mut outcomes = Vec::with_capacity(if udp.is_some() { total * 2 } else { total });
        while let Some(outcome) = outcome_rx.recv().await {
            outcomes.push(outcome);
        }

        let (outcomes, stats) = aggregator.finish(outcomes);
        tracing::info!(
            open = stats.open_ports,
            closed = stats.closed_ports,
            duration_s = stats.duration_seconds,
            "scan complete"
        );
        (outcomes, stats)
    }
}

/// One member of the worker pool.
struct Worker {
    ports: Arc<Mutex<mpsc::Receiver<Port>>>,
    outcomes: mpsc::UnboundedSender<ProbeOutcome>,
    tcp: Arc<dyn Prober>,
    udp: Option<Arc<dyn Prober>>,
    limiter: RateLimiter,
    completed: Arc<AtomicUsize>,
    total: usize,
    progress: Arc<dyn ProgressSink>,
}

impl Worker {
    async fn run(self) {
        loop {
            // The guard is released at the end of this statement.
            let next = self.ports.lock().await.recv().await;
            let Some(port) = next else {
                break;
            };

            self.submit(self.tcp.probe(port).await);
            if let Some(udp) = &self.udp {
                self.submit(udp.probe(port).await);
            }

            let done = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
            if done % PROGRESS_INTERVAL == 0 {
                self.progress.report(done, self.total);
            }

            self.limiter.pause().await;
        }
    }

    fn submit(&self, outcome: ProbeOutcome) {
        if self.outcomes.send(outcome).is_err() {
            tracing::error!("outcome collector closed before scan finished");
        }
    }
}

/// A finished scan together with the enrichment that ran after it.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub target: ScanTarget,
    pub policy_timeout_seconds: u64,
    pub outcomes: Vec<ProbeOutcome>,
    pub statistics: ScanStatistics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geolocation: Option<GeoLocation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scripts: Vec<ScriptResult>,
}

impl ScanReport {
    pub fn open_outcomes(&self) -> impl Iterator<Item = &ProbeOutcome> {
        self.outcomes.iter().filter(|o| o.is_open())
    }
}

/// Open ports whose nmap scripts run at the same time.
const SCRIPT_CONCURRENCY: usize = 4;

/// Validate `config`, resolve the host, scan, then run the optional
/// geolocation lookup and scripts.
///
/// Only configuration and resolution errors are returned, both before any
/// worker starts.
pub async fn run_scan(config: &ScanConfig, progress: Arc<dyn ProgressSink>) -> ScanResult<ScanReport> {
    run_scan_with(config, progress, &GeoLocator::new(), &ScriptRunner::new()).await
}

/// `run_scan` with explicit collaborators.
pub async fn run_scan_with(
    config: &ScanConfig,
    progress: Arc<dyn ProgressSink>,
    geolocator: &GeoLocator,
    scripts: &ScriptRunner,
) -> ScanResult<ScanReport> {
    let (range, policy) = config.validate()?;
    let target = ScanTarget::resolve(&config.host, range).await?;

    let script_names = config.script_list();
    for name in script_names.iter().filter(|name| !is_known_script(name)) {
        tracing::warn!(script = %name, "unknown nmap script, running anyway");
    }

    let engine = ScanEngine::new(target, policy).with_progress(progress);
    let (outcomes, statistics) = engine.run().await;
    let target = engine.target().clone();
    let policy = engine.policy();

    let geolocation = if config.enable_geolocation {
        let geo = geolocator.lookup(&target.ip.to_string()).await;
        if let Some(error) = &geo.error {
            tracing::warn!(ip = %target.ip, %error, "geolocation lookup failed");
        }
        Some(geo)
    } else {
        None
    };

    let script_results = if script_names.is_empty() {
        Vec::new()
    } else {
        run_scripts(scripts, &target.ip.to_string(), &outcomes, &script_names, policy.timeout).await
    };

    Ok(ScanReport {
        policy_timeout_seconds: policy.timeout_seconds(),
        target,
        outcomes,
        statistics,
        geolocation,
        scripts: script_results,
    })
}

/// Run `names` against every open TCP port, `SCRIPT_CONCURRENCY` ports at a
/// time. Results keep port order.
async fn run_scripts(
    scripts: &ScriptRunner,
    host: &str,
    outcomes: &[ProbeOutcome],
    names: &[String],
    probe_timeout: Duration,
) -> Vec<ScriptResult> {
    let runs = outcomes
        .iter()
        .filter(|o| o.is_open() && o.protocol == Protocol::Tcp)
        .map(|o| scripts.run_many(host, o.port.as_u16(), o.protocol, names, probe_timeout));

    futures::stream::iter(runs)
        .buffered(SCRIPT_CONCURRENCY)
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .flatten()
        .collect()
}
