//! One-shot HTTP GET reporting status and response time.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::debug;

pub const HTTP_TIMEOUT: Duration = Duration::from_secs(3);

/// Outcome of a successful request (any status code counts as success).
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct HttpCheck {
    pub url: String,
    pub status: u16,
    /// Standard reason phrase for `status`, not the text the server sent.
    /// `"Unknown"` for codes without one.
    pub reason: String,
    pub elapsed_ms: f64,
}

/// Prefix `http://` unless the input already names a scheme starting with `http`.
pub fn normalize_url(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.starts_with("http") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}

/// Client with the check timeout applied.
pub fn build_client() -> Result<Client> {
    Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("failed to build HTTP client")
}

/// GET `url` once and time it.
pub async fn check_url(url: &str) -> Result<HttpCheck> {
    let client = build_client()?;
    check_url_with(&client, url).await
}

pub async fn check_url_with(client: &Client, url: &str) -> Result<HttpCheck> {
    let start = Instant::now();
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("request to {url} failed"))?;
    let elapsed = start.elapsed();

    let status = response.status();
    let check = HttpCheck {
        url: url.to_string(),
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        elapsed_ms: round_ms(elapsed),
    };
    debug!(url, status = check.status, elapsed_ms = check.elapsed_ms, "http check done");
    Ok(check)
}

/// Milliseconds rounded to two decimals.
fn round_ms(d: Duration) -> f64 {
    (d.as_secs_f64() * 100_000.0).round() / 100.0
}
