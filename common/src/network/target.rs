//! # Scan Target Model
//!
//! Defines the possible inputs for a scan and their expansion into the exact
//! list of addresses a scan considers.
//!
//! Accepted forms:
//! * A single IP address (IPv4 or IPv6).
//! * An IPv4 range (e.g., `192.168.1.1-100`, `10.0.0.1-10.0.0.20`).
//! * A CIDR block (e.g., `192.168.1.0/24`).
//! * A comma separated list of the above.

use std::collections::BTreeSet;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use crate::error::{ScanError, ScanResult};
use crate::network::range::{self, Ipv4Range};

/// Represents a distinct target to be scanned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// Scan a single specific host.
    Host { target_addr: IpAddr },
    /// Scan a range of IPv4 addresses.
    Range { ipv4_range: Ipv4Range },
    /// Holds a list of different targets
    Multi { targets: Vec<Target> },
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty target".to_string());
        }

        if s.contains(',') {
            return parse_commas(s);
        }

        if let Some(target) = parse_host(s) {
            return Ok(target);
        }

        if let Some(target) = parse_ip_range(s)? {
            return Ok(target);
        }

        if let Some(target) = parse_cidr_range(s)? {
            return Ok(target);
        }

        Err(format!("invalid target: {s}"))
    }
}

impl Target {
    /// Upper bound on the number of addresses, counting overlaps twice.
    fn address_bound(&self) -> u64 {
        match self {
            Target::Host { .. } => 1,
            Target::Range { ipv4_range } => ipv4_range.len(),
            Target::Multi { targets } => targets.iter().map(Target::address_bound).sum(),
        }
    }

    fn collect_into(&self, addresses: &mut BTreeSet<IpAddr>) {
        match self {
            Target::Host { target_addr } => {
                addresses.insert(*target_addr);
            }
            Target::Range { ipv4_range } => addresses.extend(ipv4_range.to_iter()),
            Target::Multi { targets } => {
                for target in targets {
                    target.collect_into(addresses);
                }
            }
        }
    }
}

/// A validated network range together with its full address enumeration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkRange {
    raw: String,
    addresses: Vec<IpAddr>,
}

impl NetworkRange {
    /// Parses and expands `input`, rejecting ranges larger than `max_addresses`.
    pub fn parse(input: &str, max_addresses: usize) -> ScanResult<Self> {
        let target: Target =
            Target::from_str(input).map_err(|reason| ScanError::invalid_range(input, reason))?;

        let bound: u64 = target.address_bound();
        if bound > max_addresses as u64 {
            return Err(ScanError::invalid_range(
                input,
                format!("{bound} addresses exceed the limit of {max_addresses}"),
            ));
        }

        let mut addresses: BTreeSet<IpAddr> = BTreeSet::new();
        target.collect_into(&mut addresses);
        if addresses.is_empty() {
            return Err(ScanError::invalid_range(input, "range contains no addresses"));
        }

        Ok(Self {
            raw: input.trim().to_string(),
            addresses: addresses.into_iter().collect(),
        })
    }

    /// The range string as requested.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Every address the range expands to, ascending and without duplicates.
    pub fn addresses(&self) -> &[IpAddr] {
        &self.addresses
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

impl fmt::Display for NetworkRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Parses a comma-separated list of targets (e.g., "192.168.1.5, 10.0.0.1-50").
fn parse_commas(s: &str) -> Result<Target, String> {
    let mut targets = Vec::new();

    for part in s.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let target = Target::from_str(part)
            .map_err(|e| format!("failed to parse target '{part}': {e}"))?;

        targets.push(target);
    }

    if targets.is_empty() {
        return Err("empty target list".to_string());
    }

    Ok(Target::Multi { targets })
}

/// Parses a single IP address.
fn parse_host(s: &str) -> Option<Target> {
    s.parse::<IpAddr>()
        .ok()
        .map(|target_addr| Target::Host { target_addr })
}

/// Parses a range string like "1.1.1.1-2.2.2.2" or "1.1.1.1-50".
fn parse_ip_range(s: &str) -> Result<Option<Target>, String> {
    let Some((start_str, end_str)) = s.split_once('-') else {
        return Ok(None);
    };

    let start_addr = start_str
        .trim()
        .parse::<Ipv4Addr>()
        .map_err(|e| format!("invalid start IP in range '{start_str}': {e}"))?;

    let end_addr = parse_range_end_addr(end_str.trim(), &start_addr, s)?;
    if u32::from(end_addr) < u32::from(start_addr) {
        return Err(format!("range end {end_addr} is before range start {start_addr}"));
    }

    let ipv4_range = Ipv4Range::new(start_addr, end_addr);
    Ok(Some(Target::Range { ipv4_range }))
}

/// Helper to parse the end address of a range.
///
/// Handles abbreviated forms like "192.168.1.1-50" (implies 192.168.1.50)
/// and full forms like "192.168.1.1-192.168.1.255".
fn parse_range_end_addr(
    end_str: &str,
    start_addr: &Ipv4Addr,
    original_s: &str,
) -> Result<Ipv4Addr, String> {
    if let Ok(full_addr) = end_str.parse::<Ipv4Addr>() {
        return Ok(full_addr);
    }

    if end_str.is_empty() {
        return Err(format!("end range cannot be empty: {original_s}"));
    }

    let mut end_octets = start_addr.octets();
    let partial_octets: Vec<u8> = end_str
        .split('.')
        .map(|octet_str| octet_str.parse::<u8>())
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|e| format!("invalid end range '{end_str}': {e}"))?;

    if partial_octets.len() > 4 {
        return Err(format!("end range has too many octets: {end_str}"));
    }

    let start_index = 4 - partial_octets.len();
    end_octets[start_index..].copy_from_slice(&partial_octets);

    Ok(Ipv4Addr::from(end_octets))
}

/// Parses CIDR notation like "192.168.1.0/24".
fn parse_cidr_range(s: &str) -> Result<Option<Target>, String> {
    let Some((ip_str, prefix_str)) = s.split_once('/') else {
        return Ok(None);
    };

    if ip_str.parse::<std::net::Ipv6Addr>().is_ok() {
        return Err("IPv6 CIDR ranges are not supported".to_string());
    }

    let ipv4_addr = ip_str
        .parse::<Ipv4Addr>()
        .map_err(|e| format!("invalid IP in CIDR '{ip_str}': {e}"))?;

    let prefix = prefix_str
        .parse::<u8>()
        .map_err(|e| format!("invalid prefix in CIDR '{prefix_str}': {e}"))?;

    let ipv4_range = range::cidr_range(ipv4_addr, prefix).map_err(|e| e.to_string())?;

    Ok(Some(Target::Range { ipv4_range }))
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

    const LIMIT: usize = 65_536;

    #[test]
    fn test_parse_range_end_addr_helper() {
        let start = Ipv4Addr::new(192, 168, 1, 10);
        let s = "192.168.1.10-255";

        assert_eq!(
            parse_range_end_addr("192.168.1.50", &start, s),
            Ok(Ipv4Addr::new(192, 168, 1, 50))
        );
        assert_eq!(
            parse_range_end_addr("50", &start, s),
            Ok(Ipv4Addr::new(192, 168, 1, 50))
        );
        assert_eq!(
            parse_range_end_addr("2.66", &start, s),
            Ok(Ipv4Addr::new(192, 168, 2, 66))
        );

        assert!(parse_range_end_addr("2.256", &start, s).is_err());
        assert!(parse_range_end_addr("1.2.3.4.5", &start, s).is_err());
        assert!(parse_range_end_addr("", &start, s).is_err());
    }

    #[test]
    fn test_from_str_full_parsing() {
        assert!(matches!(Target::from_str("1.1.1.1"), Ok(Target::Host { .. })));
        assert!(matches!(Target::from_str("::1"), Ok(Target::Host { .. })));
        assert!(matches!(
            Target::from_str("10.0.0.1-10.0.0.255"),
            Ok(Target::Range { .. })
        ));
        assert!(matches!(
            Target::from_str("192.168.1.1-255"),
            Ok(Target::Range { .. })
        ));
        assert!(matches!(
            Target::from_str("10.0.0.0/24"),
            Ok(Target::Range { .. })
        ));
        assert!(matches!(
            Target::from_str("10.0.0.1, 10.0.1.0/30"),
            Ok(Target::Multi { .. })
        ));

        assert!(Target::from_str("not-an-ip").is_err());
        assert!(Target::from_str("10.0.0.1/33").is_err());
        assert!(Target::from_str("10.0.0.256-1.1.1.1").is_err());
        assert!(Target::from_str("10.0.0.9-1").is_err());
        assert!(Target::from_str("fe80::/64").is_err());
    }

    #[test]
    fn cidr_expands_to_exact_address_count() {
        let range = NetworkRange::parse("192.168.1.0/24", LIMIT).unwrap();
        assert_eq!(range.len(), 256);
        assert_eq!(range.addresses()[0], "192.168.1.0".parse::<IpAddr>().unwrap());

        let single = NetworkRange::parse("10.1.2.3/32", LIMIT).unwrap();
        assert_eq!(single.addresses(), &["10.1.2.3".parse::<IpAddr>().unwrap()]);
    }

    #[test]
    fn overlapping_list_is_deduplicated() {
        let range = NetworkRange::parse("10.0.0.0/30,10.0.0.2-5", LIMIT).unwrap();
        assert_eq!(range.len(), 6);
        assert_eq!(range.as_str(), "10.0.0.0/30,10.0.0.2-5");
    }

    #[test]
    fn malformed_and_oversized_ranges_are_rejected() {
        assert!(matches!(
            NetworkRange::parse("banana", LIMIT),
            Err(ScanError::InvalidRange { .. })
        ));
        assert!(matches!(
            NetworkRange::parse("10.0.0.0/8", LIMIT),
            Err(ScanError::InvalidRange { .. })
        ));
        assert!(matches!(
            NetworkRange::parse(" , ", LIMIT),
            Err(ScanError::InvalidRange { .. })
        ));
    }
}
