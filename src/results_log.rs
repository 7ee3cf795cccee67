use crate::http_check::HttpCheck;
use crate::ports::service_name;
use crate::types::ScanReport;
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const DEFAULT_LOG_FILE: &str = "scan_results.txt";

/// Append-only, human-readable record of scans and HTTP checks.
#[derive(Debug, Clone)]
pub struct ResultsLog {
    path: PathBuf,
}

impl ResultsLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `lines`, one per line, in a single open/write.
    pub fn append<I, S>(&self, lines: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open results log: {}", self.path.display()))?;
        let mut buf = String::new();
        for line in lines {
            buf.push_str(line.as_ref());
            buf.push('\n');
        }
        file.write_all(buf.as_bytes())
            .with_context(|| format!("failed to write results log: {}", self.path.display()))?;
        Ok(())
    }

    pub fn record_scan(&self, report: &ScanReport) -> Result<()> {
        self.append(scan_lines(report))
    }

    pub fn record_http(&self, check: &HttpCheck) -> Result<()> {
        self.append([
            format!("Checking URL: {}", check.url),
            format!(
                "HTTP {} -> {}, {}, {} ms",
                check.url, check.status, check.reason, check.elapsed_ms
            ),
        ])
    }

    pub fn record_http_error(&self, url: &str, err: &anyhow::Error) -> Result<()> {
        self.append([
            format!("Checking URL: {url}"),
            format!("HTTP {url} -> ERROR: {err:#}"),
        ])
    }
}

fn scan_lines(report: &ScanReport) -> Vec<String> {
    if !report.has_open_ports() {
        return vec![format!("No ports open for {}", report.host)];
    }
    let mut lines = Vec::with_capacity(report.open_ports.len() + 2);
    lines.push(format!("Open ports for {}:", report.host));
    for &p in &report.open_ports {
        lines.push(format!("Port {p}: {}", service_name(p)));
    }
    lines.push(format!("Device type guess: {}", report.label));
    lines
}
