use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use hostprobe_rs::http_check;
use hostprobe_rs::logging;
use hostprobe_rs::ports::service_name;
use hostprobe_rs::results_log::{ResultsLog, DEFAULT_LOG_FILE};
use hostprobe_rs::scanner::{self, ScanConfig};
use hostprobe_rs::types::ScanReport;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;

/// hostprobe-rs — probe the common ports of a host, guess what it is, or time an HTTP GET.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "hostprobe-rs",
    version,
    about = "Probe the common ports of a host and guess its device type, or time an HTTP GET.",
    long_about = None
)]
struct Cli {
    /// What to run. Without a subcommand an interactive menu is shown.
    #[command(subcommand)]
    command: Option<Command>,

    /// Socket connect timeout in milliseconds.
    #[arg(long = "timeout-ms", default_value_t = 300, global = true)]
    timeout_ms: u64,

    /// Human-readable results log, appended to on every run.
    #[arg(long = "log-file", default_value = DEFAULT_LOG_FILE, global = true)]
    log_file: PathBuf,

    /// Do not append to the results log.
    #[arg(long = "no-log", default_value_t = false, global = true)]
    no_log: bool,

    /// Write the result as pretty JSON to this path (optional).
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Increase diagnostic logging on stderr (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Probe the common ports of HOST and guess the device type.
    Scan { host: String },
    /// Send one GET to URL and report status code and response time.
    Http { url: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let log = (!cli.no_log).then(|| ResultsLog::new(&cli.log_file));

    let command = match cli.command.clone() {
        Some(c) => Some(c),
        None => menu_command(prompt)?,
    };

    match command {
        Some(Command::Scan { host }) => run_scan(&cli, host.trim(), log.as_ref()).await?,
        Some(Command::Http { url }) => run_http(&cli, &url, log.as_ref()).await?,
        None => {}
    }

    if let Some(log) = &log {
        println!(
            "{}",
            format!("\nResults saved to {}", log.path().display()).green()
        );
    }
    Ok(())
}

/// Interactive menu. An unknown choice runs nothing; the caller still reports
/// where results are saved.
fn menu_command(mut ask: impl FnMut(&str) -> Result<String>) -> Result<Option<Command>> {
    println!("1) Port Scan");
    println!("2) HTTP Service Check");
    let choice = ask("Choose option: ")?;
    match choice.as_str() {
        "1" => {
            let host = ask("Enter IP to scan: ")?;
            Ok(Some(Command::Scan { host }))
        }
        "2" => {
            let url = ask("Enter URL (example: http://example.com): ")?;
            Ok(Some(Command::Http { url }))
        }
        other => {
            println!("{}", format!("Unknown option: {other}").red());
            Ok(None)
        }
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(line.trim().to_string())
}

async fn run_scan(cli: &Cli, host: &str, log: Option<&ResultsLog>) -> Result<()> {
    println!("{}", format!("Scanning {host}...\n").yellow());

    let config = ScanConfig::with_timeout(Duration::from_millis(cli.timeout_ms));
    let report = scanner::scan_with(host, &config).await?;
    print_report(&report);

    if let Some(log) = log {
        if let Err(e) = log.record_scan(&report) {
            eprintln!("Failed to write results log: {e:#}");
        }
    }
    if let Some(path) = cli.output.as_deref() {
        if let Err(e) = write_results_json(path, &report) {
            eprintln!("Failed to write JSON to {}: {}", path.display(), e);
        } else {
            println!("Wrote JSON results to {}", path.display());
        }
    }
    Ok(())
}

fn print_report(report: &ScanReport) {
    if !report.has_open_ports() {
        println!(
            "{}",
            format!("\nNo common ports open on {}.", report.host).red()
        );
        return;
    }
    println!(
        "\n{}",
        format!("Open ports found on {}:", report.host).green()
    );
    for &p in &report.open_ports {
        println!("{}", format!("- Port {p}: {}", service_name(p)).yellow());
    }
    println!(
        "\n{}",
        format!("Device type guess: {}", report.label).green()
    );
}

async fn run_http(cli: &Cli, input: &str, log: Option<&ResultsLog>) -> Result<()> {
    let url = http_check::normalize_url(input);
    println!("{}", format!("Checking HTTP service: {url}").yellow());

    match http_check::check_url(&url).await {
        Ok(check) => {
            println!(
                "{}",
                format!("Status: {} ({})", check.status, check.reason).green()
            );
            println!(
                "{}",
                format!("Response Time: {} ms", check.elapsed_ms).green()
            );
            if let Some(log) = log {
                if let Err(e) = log.record_http(&check) {
                    eprintln!("Failed to write results log: {e:#}");
                }
            }
            if let Some(path) = cli.output.as_deref() {
                if let Err(e) = write_results_json(path, &check) {
                    eprintln!("Failed to write JSON to {}: {}", path.display(), e);
                }
            }
        }
        Err(e) => {
            println!("{}", format!("Error: {e:#}").red());
            if let Some(log) = log {
                if let Err(e) = log.record_http_error(&url, &e) {
                    eprintln!("Failed to write results log: {e:#}");
                }
            }
        }
    }
    Ok(())
}

fn write_results_json<T: Serialize>(path: &Path, results: &T) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, results)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(replies: &[&str]) -> impl FnMut(&str) -> Result<String> {
        let mut replies: Vec<String> = replies.iter().rev().map(|r| r.to_string()).collect();
        move |_: &str| Ok(replies.pop().unwrap_or_default())
    }

    #[test]
    fn menu_picks_scan_and_http() {
        let scan = menu_command(answers(&["1", "192.168.1.20"])).unwrap();
        assert!(matches!(scan, Some(Command::Scan { host }) if host == "192.168.1.20"));

        let http = menu_command(answers(&["2", "example.com"])).unwrap();
        assert!(matches!(http, Some(Command::Http { url }) if url == "example.com"));
    }

    #[test]
    fn unknown_choice_is_not_an_error() {
        assert!(menu_command(answers(&["7"])).unwrap().is_none());
    }

    #[test]
    fn empty_host_is_still_scanned() {
        let scan = menu_command(answers(&["1", ""])).unwrap();
        assert!(matches!(scan, Some(Command::Scan { host }) if host.is_empty()));
    }

    #[test]
    fn cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["hostprobe-rs", "scan", "10.0.0.1", "--timeout-ms", "500"])
            .unwrap();
        assert_eq!(cli.timeout_ms, 500);
        assert!(matches!(cli.command, Some(Command::Scan { host }) if host == "10.0.0.1"));
    }
}
