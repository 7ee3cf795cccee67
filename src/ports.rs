/// One row of the fixed port table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortEntry {
    pub port: u16,
    pub service: &'static str,
}

const fn entry(port: u16, service: &'static str) -> PortEntry {
    PortEntry { port, service }
}

/// Well-known ports probed on every scan, with their usual service.
pub const COMMON_PORTS: &[PortEntry] = &[
    entry(22, "SSH"),
    entry(23, "Telnet"),
    entry(53, "DNS"),
    entry(80, "HTTP"),
    entry(139, "NetBIOS"),
    entry(443, "HTTPS"),
    entry(445, "SMB"),
    entry(3389, "RDP"),
    entry(135, "RPC"),
];

/// Service label for a port, or `"Unknown"` when it is not in the table.
pub fn service_name(port: u16) -> &'static str {
    COMMON_PORTS
        .iter()
        .find(|e| e.port == port)
        .map(|e| e.service)
        .unwrap_or("Unknown")
}

/// Port numbers of the table, in table order.
pub fn default_ports() -> Vec<u16> {
    COMMON_PORTS.iter().map(|e| e.port).collect()
}
