use std::net::{IpAddr, Ipv4Addr};

use pnet::util::MacAddr;

const ARP_TABLE: &str = "/proc/net/arp";

/// Hardware address the kernel has cached for `ip`, if any.
///
/// Discovery traffic fills the neighbor table as a side effect, so by the
/// time a host is inspected its entry is usually there.
pub fn neighbor_mac(ip: IpAddr) -> Option<MacAddr> {
    let IpAddr::V4(ip) = ip else {
        return None;
    };
    let table = std::fs::read_to_string(ARP_TABLE).ok()?;
    lookup(&table, ip)
}

/// Finds `ip` in the text of `/proc/net/arp`. Incomplete entries are skipped.
pub fn lookup(table: &str, ip: Ipv4Addr) -> Option<MacAddr> {
    table.lines().skip(1).find_map(|line| {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [address, _hw_type, _flags, hw_address, ..] = fields.as_slice() else {
            return None;
        };
        if address.parse::<Ipv4Addr>().ok()? != ip {
            return None;
        }
        hw_address
            .parse::<MacAddr>()
            .ok()
            .filter(|mac| *mac != MacAddr::zero())
    })
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
