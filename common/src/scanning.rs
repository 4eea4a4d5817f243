//! # Scanning Port
//!
//! The capability interface exposed to driving adapters (CLI, API servers).

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ScanError, ScanResult};
use crate::network::host::Host;
use crate::network::topology::NetworkTopology;
use crate::wireless::WirelessIoTScan;

/// Port set and probe depth of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanType {
    /// Top well-known TCP ports, short timeouts, no service probing.
    #[default]
    Quick,
    /// Curated TCP and UDP port sets with service/version probing.
    Full,
}

impl FromStr for ScanType {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quick" => Ok(ScanType::Quick),
            "full" => Ok(ScanType::Full),
            _ => Err(ScanError::InvalidScanType(s.to_string())),
        }
    }
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanType::Quick => f.write_str("quick"),
            ScanType::Full => f.write_str("full"),
        }
    }
}

/// The four scanning operations.
///
/// Each call completes (or hits its deadline) before returning. Only input
/// validation failures and executor faults are reported as errors.
#[async_trait]
pub trait NetworkScanner: Send + Sync {
    async fn scan_network(&self, network_range: &str, scan_type: &str) -> ScanResult<NetworkTopology>;

    async fn scan_host(&self, ip: &str) -> ScanResult<Host>;

    async fn discover_hosts(&self, network_range: &str) -> ScanResult<Vec<String>>;

    async fn scan_wireless_iot(&self, network_range: Option<&str>) -> ScanResult<WirelessIoTScan>;
}

/// Parses a single address argument.
pub fn parse_ip(ip: &str) -> ScanResult<IpAddr> {
    ip.trim()
        .parse::<IpAddr>()
        .map_err(|e| ScanError::invalid_range(ip, e.to_string()))
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

    #[test]
    fn scan_type_parsing() {
        assert_eq!("quick".parse::<ScanType>(), Ok(ScanType::Quick));
        assert_eq!(" FULL ".parse::<ScanType>(), Ok(ScanType::Full));
        assert_eq!(
            "stealth".parse::<ScanType>(),
            Err(ScanError::InvalidScanType("stealth".into()))
        );
    }

    #[test]
    fn parse_ip_rejects_ranges() {
        assert!(parse_ip("127.0.0.1").is_ok());
        assert!(matches!(
            parse_ip("10.0.0.0/24"),
            Err(ScanError::InvalidRange { .. })
        ));
    }
}
