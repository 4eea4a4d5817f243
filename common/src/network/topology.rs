use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::network::host::{Host, HostState};

/// Result of a network scan.
///
/// Hosts that never answered discovery are not listed in `hosts`; they are
/// still counted in `total_hosts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkTopology {
    pub scan_id: String,
    pub network_range: String,
    pub total_hosts: usize,
    pub active_hosts: usize,
    pub hosts: Vec<Host>,
    pub scan_start: DateTime<Utc>,
    pub scan_end: DateTime<Utc>,
    pub duration: f64,
}

impl NetworkTopology {
    /// Builds the topology, deriving `active_hosts` and `duration` so both
    /// invariants hold by construction.
    pub fn assemble(
        scan_id: String,
        network_range: String,
        total_hosts: usize,
        mut hosts: Vec<Host>,
        scan_start: DateTime<Utc>,
        scan_end: DateTime<Utc>,
    ) -> Self {
        hosts.sort_by_key(|host| host.ip);
        let active_hosts = hosts
            .iter()
            .filter(|host| host.state == HostState::Up)
            .count();
        let duration = (scan_end - scan_start)
            .num_microseconds()
            .map(|micros| micros as f64 / 1_000_000.0)
            .unwrap_or_default();

        Self {
            scan_id,
            network_range,
            total_hosts: total_hosts.max(active_hosts),
            active_hosts,
            hosts,
            scan_start,
            scan_end,
            duration,
        }
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn assemble_derives_counts_and_duration() {
        let start = Utc::now();
        let end = start + Duration::milliseconds(2_500);
        let hosts = vec![
            Host::up(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 3))),
            Host::up(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))),
        ];

        let topology =
            NetworkTopology::assemble("id".into(), "10.0.0.0/30".into(), 4, hosts, start, end);

        assert_eq!(topology.active_hosts, 2);
        assert_eq!(topology.total_hosts, 4);
        assert!((topology.duration - 2.5).abs() < 1e-9);
        assert_eq!(topology.hosts[0].ip, IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)));
    }
}
