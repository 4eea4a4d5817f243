//! # IPv4 Range Model
//!
//! Inclusive ranges of IPv4 addresses, used by [`crate::network::target::Target`]
//! to represent inputs like `192.168.1.1-100` or CIDR `192.168.1.0/24`.

use std::net::{IpAddr, Ipv4Addr};

use pnet::ipnetwork::Ipv4Network;

/// Represents a continuous range of IPv4 addresses, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Range {
    pub start_addr: Ipv4Addr,
    pub end_addr: Ipv4Addr,
}

impl Ipv4Range {
    pub fn new(start_addr: Ipv4Addr, end_addr: Ipv4Addr) -> Self {
        Self {
            start_addr,
            end_addr,
        }
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Ipv4Addr> + Clone {
        let start: u32 = u32::from(self.start_addr);
        let end: u32 = u32::from(self.end_addr);
        (start..=end).map(Ipv4Addr::from)
    }

    pub fn to_iter(&self) -> impl Iterator<Item = IpAddr> {
        self.iter().map(IpAddr::V4)
    }

    /// Number of addresses in the range; zero when `start > end`.
    pub fn len(&self) -> u64 {
        let start: u64 = u32::from(self.start_addr).into();
        let end: u64 = u32::from(self.end_addr).into();
        if start > end { 0 } else { end - start + 1 }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Creates a range from an IP and a CIDR prefix (e.g., 192.168.1.0/24).
///
/// Returns the range covering the entire network block, network and broadcast
/// addresses included.
pub fn cidr_range(ip: Ipv4Addr, prefix: u8) -> anyhow::Result<Ipv4Range> {
    if prefix > 32 {
        anyhow::bail!("Invalid prefix: {prefix} > 32");
    }
    let network = Ipv4Network::new(ip, prefix)?;
    Ok(Ipv4Range::new(network.network(), network.broadcast()))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
