//! # Scan Configuration
//!
//! Every knob of the engine, with defaults suitable for a /24 on a home or
//! office LAN. Loaded from TOML; missing keys keep their defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ScanError, ScanResult};
use crate::network::ports::parse_port_list;
use crate::network::target::NetworkRange;
use crate::probe::ProbeKind;

pub const DEFAULT_FULL_PORTS: &str = "1-1024,1433,1723,1883,2020,3306,3389,5000,5432,5555,5683,\
5900,6379,8000,8008,8080,8081,8443,8554,8883,8888,9000,9100,27017,49152";

pub const DEFAULT_UDP_PORTS: &str = "53,67,123,137,161,500,1900,5353,5683";

/// How TCP ports are probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TcpTechnique {
    /// Full handshake. Works unprivileged.
    #[default]
    Connect,
    /// Half-open SYN. Requires raw sockets.
    Syn,
}

/// Per-kind probe budgets in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeTimeouts {
    pub liveness_ms: u64,
    pub connect_ms: u64,
    pub syn_ms: u64,
    pub udp_ms: u64,
    pub os_fingerprint_ms: u64,
    pub banner_ms: u64,
    pub dns_ms: u64,
}

impl Default for ProbeTimeouts {
    fn default() -> Self {
        Self {
            liveness_ms: 1_000,
            connect_ms: 1_000,
            syn_ms: 1_000,
            udp_ms: 2_000,
            os_fingerprint_ms: 1_500,
            banner_ms: 3_000,
            dns_ms: 1_000,
        }
    }
}

impl ProbeTimeouts {
    pub fn for_kind(&self, kind: ProbeKind) -> Duration {
        let ms = match kind {
            ProbeKind::Liveness => self.liveness_ms,
            ProbeKind::TcpConnect => self.connect_ms,
            ProbeKind::TcpSyn => self.syn_ms,
            ProbeKind::UdpProbe => self.udp_ms,
            ProbeKind::OsFingerprint => self.os_fingerprint_ms,
            ProbeKind::Banner => self.banner_ms,
        };
        Duration::from_millis(ms)
    }

    pub fn dns(&self) -> Duration {
        Duration::from_millis(self.dns_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Process-wide cap on simultaneous probes.
    pub max_in_flight_probes: usize,
    /// Hosts port-scanned at the same time within one scan.
    pub max_concurrent_hosts: usize,
    /// Ports probed at the same time on one host.
    pub max_ports_per_host: usize,
    /// Addresses checked at the same time during discovery.
    pub discovery_fanout: usize,
    pub timeouts: ProbeTimeouts,
    /// Extra liveness attempts after a timeout.
    pub liveness_retries: u8,
    pub scan_deadline_secs: u64,
    /// TCP port used for unprivileged liveness checks.
    pub liveness_port: u16,
    pub tcp_technique: TcpTechnique,
    pub os_detection: bool,
    pub resolve_hostnames: bool,
    pub full_ports: String,
    pub udp_ports: String,
    pub max_range_size: usize,
    /// Include closed/filtered ports in host port lists.
    pub report_closed_ports: bool,
    /// IoT survey scope when no range is given.
    pub iot_scope: Option<String>,
    /// TOML signature table replacing the built-in one.
    pub signatures: Option<PathBuf>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_in_flight_probes: 256,
            max_concurrent_hosts: 16,
            max_ports_per_host: 64,
            discovery_fanout: 256,
            timeouts: ProbeTimeouts::default(),
            liveness_retries: 1,
            scan_deadline_secs: 300,
            liveness_port: 443,
            tcp_technique: TcpTechnique::Connect,
            os_detection: true,
            resolve_hostnames: true,
            full_ports: DEFAULT_FULL_PORTS.to_string(),
            udp_ports: DEFAULT_UDP_PORTS.to_string(),
            max_range_size: 65_536,
            report_closed_ports: false,
            iot_scope: None,
            signatures: None,
        }
    }
}

impl ScanConfig {
    pub fn from_toml_str(raw: &str) -> ScanResult<Self> {
        let cfg: ScanConfig = toml::from_str(raw).map_err(|e| ScanError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> ScanResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ScanError::Config(format!("reading {}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> ScanResult<()> {
        let limits = [
            ("max_in_flight_probes", self.max_in_flight_probes),
            ("max_concurrent_hosts", self.max_concurrent_hosts),
            ("max_ports_per_host", self.max_ports_per_host),
            ("discovery_fanout", self.discovery_fanout),
            ("max_range_size", self.max_range_size),
        ];
        for (name, value) in limits {
            if value == 0 {
                return Err(ScanError::Config(format!("{name} must be greater than zero")));
            }
        }
        if self.scan_deadline_secs == 0 {
            return Err(ScanError::Config("scan_deadline_secs must be greater than zero".into()));
        }
        if self.liveness_port == 0 {
            return Err(ScanError::Config("liveness_port must be a valid port".into()));
        }
        if let Some(scope) = &self.iot_scope {
            NetworkRange::parse(scope, self.max_range_size)
                .map_err(|e| ScanError::Config(format!("iot_scope: {e}")))?;
        }
        self.full_port_list()?;
        self.udp_port_list()?;
        Ok(())
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.scan_deadline_secs)
    }

    pub fn full_port_list(&self) -> ScanResult<Vec<u16>> {
        parse_port_list(&self.full_ports).map_err(|e| ScanError::Config(format!("full_ports: {e}")))
    }

    pub fn udp_port_list(&self) -> ScanResult<Vec<u16>> {
        parse_port_list(&self.udp_ports).map_err(|e| ScanError::Config(format!("udp_ports: {e}")))
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

    #[test]
    fn defaults_are_valid() {
        let cfg = ScanConfig::default();
        assert!(cfg.validate().is_ok());
        assert!(cfg.full_port_list().unwrap().len() > 1024);
        assert_eq!(cfg.timeouts.for_kind(ProbeKind::Liveness), Duration::from_secs(1));
        assert_eq!(cfg.timeouts.for_kind(ProbeKind::Banner), Duration::from_secs(3));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = ScanConfig::from_toml_str(
            r#"
            max_in_flight_probes = 32
            tcp_technique = "syn"

            [timeouts]
            liveness_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(cfg.max_in_flight_probes, 32);
        assert_eq!(cfg.tcp_technique, TcpTechnique::Syn);
        assert_eq!(cfg.timeouts.liveness_ms, 250);
        assert_eq!(cfg.timeouts.banner_ms, 3_000);
        assert_eq!(cfg.max_concurrent_hosts, 16);
    }

    #[test]
    fn rejects_zero_limits_and_bad_ports() {
        assert!(matches!(
            ScanConfig::from_toml_str("max_concurrent_hosts = 0"),
            Err(ScanError::Config(_))
        ));
        assert!(matches!(
            ScanConfig::from_toml_str("full_ports = \"80-70\""),
            Err(ScanError::Config(_))
        ));
        assert!(matches!(
            ScanConfig::from_toml_str("unknown_key = 1"),
            Err(ScanError::Config(_))
        ));
    }

    #[test]
    fn rejects_zero_deadline() {
        assert!(matches!(
            ScanConfig::from_toml_str("scan_deadline_secs = 0"),
            Err(ScanError::Config(_))
        ));
    }

    #[test]
    fn iot_scope_must_be_a_surveyable_range() {
        assert!(ScanConfig::from_toml_str("iot_scope = \"192.168.1.0/24\"").is_ok());
        assert!(matches!(
            ScanConfig::from_toml_str("iot_scope = \"10.0.0.0/8\""),
            Err(ScanError::Config(_))
        ));
        assert!(matches!(
            ScanConfig::from_toml_str("iot_scope = \"not-a-range\""),
            Err(ScanError::Config(_))
        ));
    }
}
