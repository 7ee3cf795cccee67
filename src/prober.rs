use crate::types::{ProbeFailure, ProbeOutcome};
use std::future::Future;
use std::io::{self, ErrorKind};
use std::time::Duration;
use tokio::net::{self, TcpStream};
use tokio::time::{self, Instant};
use tracing::{debug, warn};

/// Something that can test a single (host, port) for reachability.
///
/// The scanner is generic over this so the fan-out can be exercised without a
/// live network. Implementations must never fail: every problem is reported as
/// a closed outcome.
pub trait PortProbe: Send + Sync + 'static {
    fn probe(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> impl Future<Output = ProbeOutcome> + Send;
}

/// Plain TCP connect probe.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpProber;

impl PortProbe for TcpProber {
    fn probe(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> impl Future<Output = ProbeOutcome> + Send {
        probe(host, port, timeout)
    }
}

/// Attempt one TCP connection to `host:port`, bounded by `timeout`.
///
/// The timeout covers name resolution as well as the handshake. A connected
/// stream is dropped immediately; nothing is sent or read.
pub async fn probe(host: &str, port: u16, timeout: Duration) -> ProbeOutcome {
    let outcome = bounded(connect(host, port), timeout).await;
    match outcome {
        ProbeOutcome::Open { latency } => {
            debug!(host, port, latency_ms = latency.as_millis() as u64, "port open")
        }
        ProbeOutcome::Closed(failure) => debug!(host, port, %failure, "port not open"),
    }
    outcome
}

/// Run a connect attempt under `timeout`. The stream, if any, is dropped here
/// on every path.
async fn bounded<F>(attempt: F, timeout: Duration) -> ProbeOutcome
where
    F: Future<Output = Result<TcpStream, ProbeFailure>>,
{
    let start = Instant::now();
    match time::timeout(timeout, attempt).await {
        Ok(Ok(stream)) => {
            let latency = start.elapsed();
            drop(stream);
            ProbeOutcome::Open { latency }
        }
        Ok(Err(failure)) => ProbeOutcome::Closed(failure),
        Err(_) => ProbeOutcome::Closed(ProbeFailure::Timeout),
    }
}

/// Resolve `host` and try each address in turn; the last failure wins.
async fn connect(host: &str, port: u16) -> Result<TcpStream, ProbeFailure> {
    let addrs = match net::lookup_host((host, port)).await {
        Ok(addrs) => addrs,
        Err(e) => {
            debug!(host, error = %e, "name resolution failed");
            return Err(ProbeFailure::NameResolution);
        }
    };

    let mut last = ProbeFailure::NameResolution;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                last = classify_io_error(&e);
                if last == ProbeFailure::Other {
                    warn!(%addr, error = %e, "unexpected connect error");
                }
            }
        }
    }
    Err(last)
}

/// Map a connect error onto the failure kinds the scanner records.
pub fn classify_io_error(err: &io::Error) -> ProbeFailure {
    match err.kind() {
        ErrorKind::ConnectionRefused => ProbeFailure::Refused,
        ErrorKind::TimedOut | ErrorKind::WouldBlock => ProbeFailure::Timeout,
        ErrorKind::HostUnreachable
        | ErrorKind::NetworkUnreachable
        | ErrorKind::NetworkDown
        | ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::AddrNotAvailable => ProbeFailure::Unreachable,
        _ => ProbeFailure::Other,
    }
}
