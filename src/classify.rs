use crate::types::DeviceLabel;
use std::collections::BTreeSet;

/// Ports whose presence marks a Windows host (SMB, NetBIOS session, MS-RPC).
const WINDOWS_PORTS: [u16; 3] = [445, 139, 135];
const SSH_PORT: u16 = 22;

/// Guess the device family from the set of open ports.
///
/// Rules are evaluated in order and the first match wins:
/// 1. any of 445, 139, 135 open: Windows
/// 2. 22 open: Linux / Unix
/// 3. otherwise: unknown
pub fn classify(open_ports: &BTreeSet<u16>) -> DeviceLabel {
    if WINDOWS_PORTS.iter().any(|p| open_ports.contains(p)) {
        DeviceLabel::Windows
    } else if open_ports.contains(&SSH_PORT) {
        DeviceLabel::LinuxUnix
    } else {
        DeviceLabel::Unknown
    }
}

/// Convenience wrapper for callers holding a list instead of a set.
pub fn classify_ports(ports: impl IntoIterator<Item = u16>) -> DeviceLabel {
    classify(&ports.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ports: &[u16]) -> BTreeSet<u16> {
        ports.iter().copied().collect()
    }

    #[test]
    fn any_windows_port_wins() {
        for p in WINDOWS_PORTS {
            assert_eq!(classify(&set(&[p])), DeviceLabel::Windows);
            assert_eq!(classify(&set(&[p, 22, 80])), DeviceLabel::Windows);
        }
        assert_eq!(classify(&set(&[445, 139, 135, 80])), DeviceLabel::Windows);
    }

    #[test]
    fn ssh_without_windows_ports_is_unix() {
        assert_eq!(classify(&set(&[22])), DeviceLabel::LinuxUnix);
        assert_eq!(classify(&set(&[22, 80, 443])), DeviceLabel::LinuxUnix);
    }

    #[test]
    fn nothing_identifying_is_unknown() {
        assert_eq!(classify(&BTreeSet::new()), DeviceLabel::Unknown);
        assert_eq!(classify(&set(&[80, 443, 3389, 53, 23])), DeviceLabel::Unknown);
        assert_eq!(classify(&set(&[8080, 9000])), DeviceLabel::Unknown);
    }

    #[test]
    fn construction_order_does_not_matter() {
        let forward = classify_ports([22, 445, 80]);
        let backward = classify_ports([80, 445, 22]);
        let duplicated = classify_ports([80, 22, 22, 445, 445]);
        assert_eq!(forward, DeviceLabel::Windows);
        assert_eq!(forward, backward);
        assert_eq!(forward, duplicated);
    }
}
