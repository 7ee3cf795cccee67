use crate::classify::classify;
use crate::ports::{self, service_name};
use crate::prober::{PortProbe, TcpProber};
use crate::types::{PortFinding, ProbeOutcome, ScanReport};
use ::time::{format_description::well_known, OffsetDateTime};
use anyhow::{anyhow, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinSet};
use tokio::time::Instant;
use tracing::{error, info};

/// Per-connect timeout used when none is given.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(300);

/// Knobs for one scan. The probed ports always come from the fixed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    /// Connect timeout applied to every port alike.
    pub timeout: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ScanConfig {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

/// Probe every common port on `host` concurrently and guess the device type.
pub async fn scan(host: &str) -> Result<ScanReport> {
    scan_internal(host, &ScanConfig::default(), Arc::new(TcpProber)).await
}

/// Same as [`scan`] with an explicit configuration.
pub async fn scan_with(host: &str, config: &ScanConfig) -> Result<ScanReport> {
    scan_internal(host, config, Arc::new(TcpProber)).await
}

/// Variant that lets the caller supply the probe implementation.
pub async fn scan_with_prober<P: PortProbe>(
    host: &str,
    config: &ScanConfig,
    prober: Arc<P>,
) -> Result<ScanReport> {
    scan_internal(host, config, prober).await
}

/// Spawns one task per port, waits for all of them, then aggregates.
///
/// Each task hands its outcome back through the `JoinSet`; only this function
/// touches the result maps, so no outcome can be lost or counted twice. Connect
/// failures are ordinary outcomes. A task that panicked is reported as an error
/// once every other task has finished.
async fn scan_internal<P: PortProbe>(
    host: &str,
    config: &ScanConfig,
    prober: Arc<P>,
) -> Result<ScanReport> {
    let start = Instant::now();
    let host_shared: Arc<str> = Arc::from(host);
    let timeout = config.timeout;
    let targets: BTreeSet<u16> = ports::default_ports().into_iter().collect();

    let mut set = JoinSet::new();
    for &port in &targets {
        let prober = prober.clone();
        let host = host_shared.clone();
        set.spawn(async move {
            let outcome = prober.probe(&host, port, timeout).await;
            (port, outcome)
        });
    }

    let mut outcomes: BTreeMap<u16, ProbeOutcome> = BTreeMap::new();
    let mut task_failure: Option<JoinError> = None;
    while let Some(res) = set.join_next().await {
        match res {
            Ok((port, outcome)) => {
                outcomes.insert(port, outcome);
            }
            Err(e) => {
                error!(host, error = %e, "probe task failed");
                task_failure.get_or_insert(e);
            }
        }
    }
    if let Some(e) = task_failure {
        return Err(anyhow!("probe task for {host} did not complete: {e}"));
    }

    let open_ports: BTreeSet<u16> = outcomes
        .iter()
        .filter(|(_, o)| o.is_open())
        .map(|(&p, _)| p)
        .collect();
    let label = classify(&open_ports);
    let findings = outcomes
        .iter()
        .map(|(&port, outcome)| to_finding(port, outcome))
        .collect();
    let elapsed_ms = start.elapsed().as_millis() as u64;

    info!(
        host,
        open = open_ports.len(),
        probed = targets.len(),
        elapsed_ms,
        %label,
        "scan finished"
    );

    Ok(ScanReport {
        host: host.to_string(),
        open_ports,
        label,
        findings,
        elapsed_ms,
        timestamp: now_iso_like(),
    })
}

fn to_finding(port: u16, outcome: &ProbeOutcome) -> PortFinding {
    let latency_ms = match outcome {
        ProbeOutcome::Open { latency } => Some(latency.as_millis() as u64),
        ProbeOutcome::Closed(_) => None,
    };
    PortFinding {
        port,
        service: service_name(port).to_string(),
        open: outcome.is_open(),
        latency_ms,
        failure: outcome.failure(),
    }
}

fn now_iso_like() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}
