use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Why a single probe did not report the port as open.
///
/// Callers of the scan only see open vs. not-open; the kind is kept for logs and
/// the JSON report.
#[derive(Error, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProbeFailure {
    #[error("connection refused")]
    Refused,
    #[error("timed out")]
    Timeout,
    #[error("host unreachable")]
    Unreachable,
    #[error("name resolution failed")]
    NameResolution,
    #[error("connect failed")]
    Other,
}

/// Result of one connection attempt against a (host, port) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Open { latency: Duration },
    Closed(ProbeFailure),
}

impl ProbeOutcome {
    pub fn is_open(&self) -> bool {
        matches!(self, ProbeOutcome::Open { .. })
    }

    pub fn failure(&self) -> Option<ProbeFailure> {
        match self {
            ProbeOutcome::Open { .. } => None,
            ProbeOutcome::Closed(f) => Some(*f),
        }
    }
}

/// Heuristic OS-family guess derived from the open ports of a host.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceLabel {
    #[serde(rename = "Windows device")]
    Windows,
    #[serde(rename = "Linux / Unix / Raspberry Pi")]
    LinuxUnix,
    #[serde(rename = "Unknown device")]
    Unknown,
}

impl DeviceLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceLabel::Windows => "Windows device",
            DeviceLabel::LinuxUnix => "Linux / Unix / Raspberry Pi",
            DeviceLabel::Unknown => "Unknown device",
        }
    }
}

impl fmt::Display for DeviceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-port line of a scan report.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PortFinding {
    pub port: u16,
    pub service: String,
    pub open: bool,
    pub latency_ms: Option<u64>,
    pub failure: Option<ProbeFailure>,
}

/// Aggregated result of one scan invocation.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ScanReport {
    pub host: String,
    pub open_ports: BTreeSet<u16>,
    pub label: DeviceLabel,
    pub findings: Vec<PortFinding>,
    pub elapsed_ms: u64,
    pub timestamp: String,
}

impl ScanReport {
    pub fn has_open_ports(&self) -> bool {
        !self.open_ports.is_empty()
    }
}
