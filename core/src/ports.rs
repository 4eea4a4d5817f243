//! # Port and Service Scanning
//!
//! Probes the ports of one host and turns every open port into a
//! service/version guess. What gets probed, and how deeply, is described by a
//! [`ScanProfile`].

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::Arc;

use futures::{FutureExt, StreamExt, TryStreamExt, stream};
use netsurvey_common::config::{ScanConfig, TcpTechnique};
use netsurvey_common::error::{ProbeFailure, ScanResult};
use netsurvey_common::network::host::{Port, PortState, Protocol};
use netsurvey_common::probe::{ProbeKind, ProbeResponse, ProbeTarget};
use netsurvey_common::scanning::ScanType;
use netsurvey_common::signatures::SignatureTable;
use netsurvey_protocols::{banner, services};
use tokio::time::Instant;
use tracing::debug;

use crate::pool::ProbePool;

/// Ports to probe and whether to interrogate open ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanProfile {
    pub tcp_ports: Vec<u16>,
    pub udp_ports: Vec<u16>,
    pub probe_services: bool,
}

impl ScanProfile {
    /// Top TCP ports, names from the port table only.
    pub fn quick() -> Self {
        let mut tcp_ports = services::TOP_TCP_PORTS.to_vec();
        tcp_ports.sort_unstable();
        Self {
            tcp_ports,
            udp_ports: Vec::new(),
            probe_services: false,
        }
    }

    /// The configured TCP and UDP sets with service probing.
    pub fn full(config: &ScanConfig) -> ScanResult<Self> {
        Ok(Self {
            tcp_ports: config.full_port_list()?,
            udp_ports: config.udp_port_list()?,
            probe_services: true,
        })
    }

    /// Quick ports plus every port the IoT rules care about, with service probing.
    pub fn iot(signatures: &SignatureTable) -> Self {
        let mut profile = Self::quick();
        for rule in &signatures.iot.ports {
            match rule.protocol {
                Protocol::Tcp => profile.tcp_ports.push(rule.port),
                Protocol::Udp => profile.udp_ports.push(rule.port),
            }
        }
        profile.tcp_ports.sort_unstable();
        profile.tcp_ports.dedup();
        profile.udp_ports.sort_unstable();
        profile.udp_ports.dedup();
        profile.probe_services = true;
        profile
    }

    pub fn for_scan_type(scan_type: ScanType, config: &ScanConfig) -> ScanResult<Self> {
        match scan_type {
            ScanType::Quick => Ok(Self::quick()),
            ScanType::Full => Self::full(config),
        }
    }

    pub fn probe_count(&self) -> usize {
        self.tcp_ports.len() + self.udp_ports.len()
    }
}

/// Everything learned from the ports of one host.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortReport {
    /// Sorted by port number, TCP before UDP.
    pub ports: Vec<Port>,
    /// Banner text per open TCP port.
    pub banners: BTreeMap<u16, String>,
    /// TTL and window of the first SYN-ACK seen, when SYN probing was used.
    pub ttl: Option<u8>,
    pub window_size: Option<u16>,
}

struct PortObservation {
    port: Port,
    banner: Option<String>,
    stack: Option<(Option<u8>, Option<u16>)>,
}

pub struct PortScanner {
    pool: Arc<ProbePool>,
    per_host: usize,
    technique: TcpTechnique,
    report_closed: bool,
}

impl PortScanner {
    pub fn new(pool: Arc<ProbePool>, config: &ScanConfig) -> Self {
        Self {
            pool,
            per_host: config.max_ports_per_host.max(1),
            technique: config.tcp_technique,
            report_closed: config.report_closed_ports,
        }
    }

    fn tcp_kind(&self) -> ProbeKind {
        match self.technique {
            TcpTechnique::Syn if self.pool.executor().supports(ProbeKind::TcpSyn) => ProbeKind::TcpSyn,
            _ => ProbeKind::TcpConnect,
        }
    }

    /// Probes every port of `profile` on `ip`. Fails only on an executor fault.
    pub async fn scan_ports(
        &self,
        ip: IpAddr,
        profile: &ScanProfile,
        deadline: Instant,
    ) -> Result<PortReport, ProbeFailure> {
        let tcp_kind = self.tcp_kind();
        let probe_services = profile.probe_services;
        let jobs: Vec<(u16, Protocol)> = profile
            .tcp_ports
            .iter()
            .map(|port| (*port, Protocol::Tcp))
            .chain(profile.udp_ports.iter().map(|port| (*port, Protocol::Udp)))
            .collect();

        let observations: Vec<PortObservation> = stream::iter(jobs)
            .map(|(port, protocol)| {
                async move {
                    match protocol {
                        Protocol::Tcp => self.probe_tcp(ip, port, tcp_kind, probe_services, deadline).await,
                        Protocol::Udp => self.probe_udp(ip, port, deadline).await,
                    }
                }
                .boxed()
            })
            .buffer_unordered(self.per_host)
            .try_collect()
            .await?;

        Ok(self.assemble(ip, observations))
    }

    fn assemble(&self, ip: IpAddr, observations: Vec<PortObservation>) -> PortReport {
        let mut report = PortReport::default();
        let (mut closed, mut filtered) = (0usize, 0usize);

        for observation in observations {
            match observation.port.state {
                PortState::Closed => closed += 1,
                PortState::Filtered => filtered += 1,
                PortState::Open => {}
            }
            if report.ttl.is_none()
                && observation.port.state == PortState::Open
                && let Some((ttl, window)) = observation.stack
            {
                report.ttl = ttl;
                report.window_size = window;
            }
            if let Some(text) = observation.banner {
                report.banners.insert(observation.port.number, text);
            }
            if observation.port.state == PortState::Open || self.report_closed {
                report.ports.push(observation.port);
            }
        }

        report.ports.sort_by_key(Port::sort_key);
        report.ports.dedup_by_key(|port| port.sort_key());
        debug!(
            %ip,
            open = report.ports.iter().filter(|p| p.state == PortState::Open).count(),
            closed,
            filtered,
            "port scan finished"
        );
        report
    }

    async fn probe_tcp(
        &self,
        ip: IpAddr,
        port: u16,
        kind: ProbeKind,
        probe_services: bool,
        deadline: Instant,
    ) -> Result<PortObservation, ProbeFailure> {
        let target = ProbeTarget::port(ip, port);
        let (state, stack) = match self.pool.probe(target, kind, deadline).await {
            Ok(response) => (
                response.port_state.unwrap_or(PortState::Open),
                Some((response.ttl, response.window_size)),
            ),
            Err(ProbeFailure::Fault(reason)) => return Err(ProbeFailure::Fault(reason)),
            Err(_) => (PortState::Filtered, None),
        };

        let table_name = services::service_or_unknown(port, Protocol::Tcp);
        if state != PortState::Open || !probe_services {
            return Ok(PortObservation {
                port: Port::tcp(port, state, table_name),
                banner: None,
                stack,
            });
        }

        let (port_record, banner) = match self.pool.probe(target, ProbeKind::Banner, deadline).await {
            Ok(response) => interpret(port, Protocol::Tcp, state, &response),
            Err(ProbeFailure::Fault(reason)) => return Err(ProbeFailure::Fault(reason)),
            Err(_) => (Port::tcp(port, state, "unknown"), None),
        };
        Ok(PortObservation {
            port: port_record,
            banner,
            stack,
        })
    }

    async fn probe_udp(&self, ip: IpAddr, port: u16, deadline: Instant) -> Result<PortObservation, ProbeFailure> {
        let target = ProbeTarget::port(ip, port);
        let observation = match self.pool.probe(target, ProbeKind::UdpProbe, deadline).await {
            Ok(response) => {
                let state = response.port_state.unwrap_or(PortState::Open);
                let (port, banner) = interpret(port, Protocol::Udp, state, &response);
                PortObservation {
                    port,
                    banner,
                    stack: None,
                }
            }
            Err(ProbeFailure::Fault(reason)) => return Err(ProbeFailure::Fault(reason)),
            Err(_) => PortObservation {
                port: Port::new(port, Protocol::Udp, PortState::Filtered, services::service_or_unknown(port, Protocol::Udp)),
                banner: None,
                stack: None,
            },
        };
        Ok(observation)
    }
}

/// Service name and version from a probe response, falling back to the port table.
fn interpret(port: u16, protocol: Protocol, state: PortState, response: &ProbeResponse) -> (Port, Option<String>) {
    let table_name = services::service_or_unknown(port, protocol);
    if state != PortState::Open {
        return (Port::new(port, protocol, state, table_name), None);
    }

    let guess = response.banner.as_deref().and_then(banner::identify);
    let record = match guess {
        Some(guess) => Port::new(port, protocol, state, guess.service).with_version(guess.version),
        None => Port::new(port, protocol, state, table_name),
    };
    let text = match protocol {
        Protocol::Tcp => response.banner_text(),
        Protocol::Udp => None,
    };
    (record, text)
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
    use async_trait::async_trait;
    use netsurvey_common::config::ProbeTimeouts;
    use netsurvey_common::probe::{ProbeExecutor, ProbeOutcome};
    use std::collections::HashMap;
    use std::time::Duration;

    /// Open TCP ports with optional banners; every other port refuses.
    struct Services {
        open: HashMap<u16, Option<&'static [u8]>>,
        banner_fails: bool,
    }

    #[async_trait]
    impl ProbeExecutor for Services {
        async fn probe(&self, target: ProbeTarget, kind: ProbeKind, _timeout: Duration) -> ProbeOutcome {
            let port = target.port.unwrap_or_default();
            let rtt = Duration::from_millis(1);
            match (kind, self.open.get(&port)) {
                (ProbeKind::UdpProbe, _) => Err(ProbeFailure::Timeout),
                (ProbeKind::Banner, _) if self.banner_fails => Err(ProbeFailure::Timeout),
                (ProbeKind::Banner, Some(Some(banner))) => {
                    Ok(ProbeResponse::new(rtt).with_state(PortState::Open).with_banner(banner.to_vec()))
                }
                (ProbeKind::Banner, _) => Ok(ProbeResponse::new(rtt).with_state(PortState::Open)),
                (_, Some(_)) => Ok(ProbeResponse::new(rtt).with_state(PortState::Open)),
                (_, None) => Ok(ProbeResponse::new(rtt).with_state(PortState::Closed)),
            }
        }
    }

    fn scanner(executor: Services, config: &ScanConfig) -> PortScanner {
        let pool = Arc::new(ProbePool::new(Arc::new(executor), 16, ProbeTimeouts::default()));
        PortScanner::new(pool, config)
    }

    fn localhost() -> IpAddr {
        "127.0.0.1".parse().unwrap()
    }

    fn deadline() -> Instant {
        Instant::now() + Duration::from_secs(30)
    }

    #[tokio::test]
    async fn quick_scan_names_ports_from_table() {
        let executor = Services {
            open: HashMap::from([(80, None), (22, None)]),
            banner_fails: false,
        };
        let report = scanner(executor, &ScanConfig::default())
            .scan_ports(localhost(), &ScanProfile::quick(), deadline())
            .await
            .unwrap();

        let summary: Vec<(u16, &str)> = report.ports.iter().map(|p| (p.number, p.service.as_str())).collect();
        assert_eq!(summary, vec![(22, "ssh"), (80, "http")]);
        assert!(report.ports.iter().all(|p| p.version.is_none()));
    }

    #[tokio::test]
    async fn full_scan_reads_versions() {
        let executor = Services {
            open: HashMap::from([
                (22, Some(&b"SSH-2.0-OpenSSH_9.6\r\n"[..])),
                (8080, Some(&b"HTTP/1.1 200 OK\r\nServer: lighttpd/1.4.59\r\n\r\n"[..])),
                (9100, Some(&b"@PJL INFO STATUS"[..])),
            ]),
            banner_fails: false,
        };
        let config = ScanConfig {
            udp_ports: "161".into(),
            ..ScanConfig::default()
        };
        let profile = ScanProfile::full(&config).unwrap();
        let report = scanner(executor, &config)
            .scan_ports(localhost(), &profile, deadline())
            .await
            .unwrap();

        assert_eq!(report.ports.len(), 3);
        assert_eq!(report.ports[0].version.as_deref(), Some("OpenSSH 9.6"));
        assert_eq!(report.ports[1].service, "http");
        assert_eq!(report.ports[1].version.as_deref(), Some("lighttpd/1.4.59"));
        assert_eq!(report.ports[2].service, "jetdirect");
        assert_eq!(report.ports[2].version, None);
        assert!(report.banners[&8080].contains("lighttpd"));
    }

    #[tokio::test]
    async fn failed_service_probe_downgrades_to_unknown() {
        let executor = Services {
            open: HashMap::from([(22, None)]),
            banner_fails: true,
        };
        let config = ScanConfig {
            full_ports: "22".into(),
            udp_ports: "53".into(),
            ..ScanConfig::default()
        };
        let profile = ScanProfile::full(&config).unwrap();
        let report = scanner(executor, &config)
            .scan_ports(localhost(), &profile, deadline())
            .await
            .unwrap();

        assert_eq!(report.ports, vec![Port::tcp(22, PortState::Open, "unknown")]);
    }

    #[tokio::test]
    async fn closed_ports_are_reported_on_request() {
        let executor = Services {
            open: HashMap::from([(443, None)]),
            banner_fails: false,
        };
        let config = ScanConfig {
            report_closed_ports: true,
            ..ScanConfig::default()
        };
        let report = scanner(executor, &config)
            .scan_ports(localhost(), &ScanProfile::quick(), deadline())
            .await
            .unwrap();

        assert_eq!(report.ports.len(), services::TOP_TCP_PORTS.len());
        assert!(report.ports.windows(2).all(|w| w[0].number < w[1].number));
    }

    #[test]
    fn iot_profile_extends_quick_profile() {
        let profile = ScanProfile::iot(&SignatureTable::builtin());
        assert!(profile.tcp_ports.contains(&1883));
        assert!(profile.tcp_ports.contains(&80));
        assert!(profile.udp_ports.contains(&5683));
        assert!(profile.probe_services);
        assert!(profile.probe_count() > ScanProfile::quick().probe_count());
    }
}
