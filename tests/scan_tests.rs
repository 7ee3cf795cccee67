use hostprobe_rs::prober::{probe, PortProbe};
use hostprobe_rs::scanner::{scan_with, scan_with_prober, ScanConfig};
use hostprobe_rs::types::{DeviceLabel, ProbeFailure, ProbeOutcome};
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Real TCP probes, with table ports redirected to local ports on 127.0.0.1.
/// Unmapped table ports go to a port nobody listens on.
struct LoopbackMap {
    ports: HashMap<u16, u16>,
    closed: u16,
}

impl PortProbe for LoopbackMap {
    fn probe(
        &self,
        _host: &str,
        port: u16,
        timeout: Duration,
    ) -> impl Future<Output = ProbeOutcome> + Send {
        let target = self.ports.get(&port).copied().unwrap_or(self.closed);
        async move { probe("127.0.0.1", target, timeout).await }
    }
}

async fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Bind one listener per table port; listeners must outlive the scan.
async fn expose(table_ports: &[u16]) -> (Vec<TcpListener>, Arc<LoopbackMap>) {
    let mut listeners = Vec::new();
    let mut ports = HashMap::new();
    for &p in table_ports {
        let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
        ports.insert(p, l.local_addr().unwrap().port());
        listeners.push(l);
    }
    let closed = free_port().await;
    (listeners, Arc::new(LoopbackMap { ports, closed }))
}

#[tokio::test]
async fn ssh_and_http_listeners_are_found_every_time() {
    let (_listeners, prober) = expose(&[22, 80]).await;
    let config = ScanConfig::default();
    for _ in 0..10 {
        let report = scan_with_prober("lab-host", &config, prober.clone())
            .await
            .expect("scan ok");
        assert_eq!(report.open_ports, BTreeSet::from([22, 80]));
        assert_eq!(report.label, DeviceLabel::LinuxUnix);
        assert_eq!(report.findings.len(), 9);
        let telnet = report.findings.iter().find(|f| f.port == 23).unwrap();
        assert!(!telnet.open);
        assert_eq!(telnet.failure, Some(ProbeFailure::Refused));
    }
}

#[tokio::test]
async fn smb_listener_marks_windows() {
    let (_listeners, prober) = expose(&[445, 22, 80]).await;
    let report = scan_with_prober("lab-host", &ScanConfig::default(), prober)
        .await
        .expect("scan ok");
    assert_eq!(report.open_ports, BTreeSet::from([22, 80, 445]));
    assert_eq!(report.label, DeviceLabel::Windows);
}

#[tokio::test]
async fn no_listeners_reports_nothing_open() {
    let (_listeners, prober) = expose(&[]).await;
    let report = scan_with_prober("lab-host", &ScanConfig::default(), prober)
        .await
        .expect("scan ok");
    assert!(report.open_ports.is_empty());
    assert_eq!(report.label, DeviceLabel::Unknown);
}

#[tokio::test]
async fn empty_host_scans_without_error() {
    let config = ScanConfig::with_timeout(Duration::from_millis(300));
    let report = scan_with("", &config).await.expect("scan ok");
    assert!(report.open_ports.is_empty());
    assert_eq!(report.label, DeviceLabel::Unknown);
    assert_eq!(report.findings.len(), 9);
}

#[tokio::test]
async fn report_serializes_with_label_string() {
    let (_listeners, prober) = expose(&[22]).await;
    let report = scan_with_prober("lab-host", &ScanConfig::default(), prober)
        .await
        .unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["label"], "Linux / Unix / Raspberry Pi");
    assert_eq!(json["open_ports"], serde_json::json!([22]));
    assert_eq!(json["findings"][0]["port"], 22);
    assert_eq!(json["findings"][0]["service"], "SSH");
    assert_eq!(json["findings"][1]["failure"], "refused");
}
