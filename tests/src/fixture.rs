//! A deterministic [`ProbeExecutor`] for scenario tests.
//!
//! Hosts are declared up front with their open ports, banners and stack
//! characteristics. Anything not declared stays silent, so probes against it
//! run into the pool's timeout exactly like an unresponsive address would.

use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use netsurvey_common::config::ScanConfig;
use netsurvey_common::error::ProbeFailure;
use netsurvey_common::network::host::PortState;
use netsurvey_common::probe::{ProbeExecutor, ProbeKind, ProbeOutcome, ProbeResponse, ProbeTarget};
use netsurvey_common::wireless::{WirelessNetwork, WirelessScanner};
use netsurvey_core::ScanEngine;
use pnet::util::MacAddr;
use tokio::time;

#[derive(Debug, Clone)]
pub struct FixtureHost {
    answers_liveness: bool,
    tcp: BTreeMap<u16, Option<Vec<u8>>>,
    udp: BTreeMap<u16, Vec<u8>>,
    ttl: u8,
    window: u16,
    mac: Option<MacAddr>,
    hostname: Option<String>,
}

impl Default for FixtureHost {
    fn default() -> Self {
        Self {
            answers_liveness: true,
            tcp: BTreeMap::new(),
            udp: BTreeMap::new(),
            ttl: 64,
            window: 29200,
            mac: None,
            hostname: None,
        }
    }
}

impl FixtureHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open TCP port; `banner` is what a banner probe reads from it.
    pub fn tcp(mut self, port: u16, banner: Option<&[u8]>) -> Self {
        self.tcp.insert(port, banner.map(<[u8]>::to_vec));
        self
    }

    pub fn udp(mut self, port: u16, reply: &[u8]) -> Self {
        self.udp.insert(port, reply.to_vec());
        self
    }

    pub fn stack(mut self, ttl: u8, window: u16) -> Self {
        self.ttl = ttl;
        self.window = window;
        self
    }

    pub fn mac(mut self, mac: MacAddr) -> Self {
        self.mac = Some(mac);
        self
    }

    pub fn hostname(mut self, name: &str) -> Self {
        self.hostname = Some(name.to_string());
        self
    }

    /// Drops liveness probes but still answers on its ports.
    pub fn ignoring_liveness(mut self) -> Self {
        self.answers_liveness = false;
        self
    }
}

#[derive(Default)]
pub struct FixtureExecutor {
    hosts: HashMap<IpAddr, FixtureHost>,
    delay: Duration,
    fault_on: Option<ProbeKind>,
    unprivileged: bool,
    counts: Mutex<HashMap<ProbeKind, usize>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FixtureExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host(mut self, ip: &str, host: FixtureHost) -> Self {
        let ip: IpAddr = ip.parse().expect("fixture host address");
        self.hosts.insert(ip, host);
        self
    }

    /// Every answer takes this long.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Probes of `kind` fail with [`ProbeFailure::Fault`].
    pub fn fault_on(mut self, kind: ProbeKind) -> Self {
        self.fault_on = Some(kind);
        self
    }

    /// Reports no support for raw-socket probe kinds.
    pub fn unprivileged(mut self) -> Self {
        self.unprivileged = true;
        self
    }

    pub fn count(&self, kind: ProbeKind) -> usize {
        self.counts.lock().expect("counts lock").get(&kind).copied().unwrap_or(0)
    }

    /// TCP and UDP port probes, banners excluded.
    pub fn port_probes(&self) -> usize {
        self.count(ProbeKind::TcpConnect) + self.count(ProbeKind::TcpSyn) + self.count(ProbeKind::UdpProbe)
    }

    pub fn total_probes(&self) -> usize {
        ProbeKind::ALL.iter().map(|kind| self.count(*kind)).sum()
    }

    /// Highest number of probes that were running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn answer(&self, target: ProbeTarget, kind: ProbeKind) -> Option<ProbeResponse> {
        let host = self.hosts.get(&target.addr)?;
        let response = ProbeResponse::new(self.delay);
        let port = target.port.unwrap_or_default();

        match kind {
            ProbeKind::Liveness => host
                .answers_liveness
                .then(|| response.with_stack(Some(host.ttl), None)),
            ProbeKind::TcpConnect | ProbeKind::TcpSyn => Some(match host.tcp.contains_key(&port) {
                true => response.with_state(PortState::Open).with_stack(Some(host.ttl), Some(host.window)),
                false => response.with_state(PortState::Closed),
            }),
            ProbeKind::Banner => Some(match host.tcp.get(&port) {
                Some(banner) => response
                    .with_state(PortState::Open)
                    .with_banner(banner.clone().unwrap_or_default()),
                None => response.with_state(PortState::Closed),
            }),
            ProbeKind::UdpProbe => host
                .udp
                .get(&port)
                .map(|reply| response.with_state(PortState::Open).with_banner(reply.clone())),
            ProbeKind::OsFingerprint => {
                Some(response.with_state(PortState::Open).with_stack(Some(host.ttl), Some(host.window)))
            }
        }
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProbeExecutor for FixtureExecutor {
    async fn probe(&self, target: ProbeTarget, kind: ProbeKind, _timeout: Duration) -> ProbeOutcome {
        *self.counts.lock().expect("counts lock").entry(kind).or_default() += 1;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        if self.fault_on == Some(kind) {
            return Err(ProbeFailure::Fault(format!("injected {kind} fault")));
        }
        if !self.delay.is_zero() {
            time::sleep(self.delay).await;
        }
        match self.answer(target, kind) {
            Some(response) => Ok(response),
            None => std::future::pending().await,
        }
    }

    fn supports(&self, kind: ProbeKind) -> bool {
        !(self.unprivileged && matches!(kind, ProbeKind::TcpSyn | ProbeKind::OsFingerprint))
    }

    fn neighbor_mac(&self, ip: IpAddr) -> Option<MacAddr> {
        self.hosts.get(&ip).and_then(|host| host.mac)
    }

    async fn resolve_hostname(&self, ip: IpAddr, _timeout: Duration) -> Option<String> {
        self.hosts.get(&ip).and_then(|host| host.hostname.clone())
    }
}

/// Access points reported by a fake radio.
pub struct FixtureWireless(pub Vec<WirelessNetwork>);

#[async_trait]
impl WirelessScanner for FixtureWireless {
    async fn scan_networks(&self) -> Vec<WirelessNetwork> {
        self.0.clone()
    }
}

/// Configuration with short timeouts suited to paused-clock tests.
pub fn test_config() -> ScanConfig {
    let mut config = ScanConfig::default();
    config.timeouts.liveness_ms = 200;
    config.timeouts.connect_ms = 200;
    config.timeouts.syn_ms = 200;
    config.timeouts.udp_ms = 300;
    config.timeouts.os_fingerprint_ms = 200;
    config.timeouts.banner_ms = 300;
    config.scan_deadline_secs = 30;
    config
}

pub fn engine(fixture: &Arc<FixtureExecutor>, config: ScanConfig) -> ScanEngine {
    ScanEngine::builder(config)
        .executor(fixture.clone())
        .build()
        .expect("fixture engine")
}
