//! # Network Probe Executor
//!
//! The production [`ProbeExecutor`]: TCP and UDP probes through ordinary
//! sockets, and ICMP echo, half-open SYN and OS fingerprint probes through raw
//! sockets when the process runs as root.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use netsurvey_common::error::ProbeFailure;
use netsurvey_common::network::host::PortState;
use netsurvey_common::probe::{ProbeExecutor, ProbeKind, ProbeOutcome, ProbeResponse, ProbeTarget};
use netsurvey_protocols::tcp::SynReply;
use pnet::util::MacAddr;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::network::icmp::Pinger;
use crate::network::syn::SynProber;
use crate::network::{arp, interface, resolver, tcp, udp};

struct RawProbers {
    syn: SynProber,
    ping: Pinger,
}

impl RawProbers {
    fn open() -> anyhow::Result<Self> {
        Ok(Self {
            syn: SynProber::open()?,
            ping: Pinger::open()?,
        })
    }
}

pub struct NetProbeExecutor {
    liveness_port: u16,
    raw: Option<RawProbers>,
    nameserver: Option<SocketAddr>,
}

impl NetProbeExecutor {
    /// Opens raw channels when running as root and falls back to plain
    /// sockets otherwise.
    pub fn new(liveness_port: u16) -> Self {
        let raw = if is_root::is_root() {
            match RawProbers::open() {
                Ok(raw) => Some(raw),
                Err(e) => {
                    warn!("raw sockets unavailable, using unprivileged probes: {e}");
                    None
                }
            }
        } else {
            debug!("not running as root: ICMP, SYN and OS fingerprint probes disabled");
            None
        };
        Self {
            liveness_port,
            raw,
            nameserver: resolver::system_nameserver(),
        }
    }

    /// An executor that never touches raw sockets.
    pub fn unprivileged(liveness_port: u16) -> Self {
        Self {
            liveness_port,
            raw: None,
            nameserver: resolver::system_nameserver(),
        }
    }

    pub fn is_privileged(&self) -> bool {
        self.raw.is_some()
    }

    fn raw(&self, kind: ProbeKind) -> Result<&RawProbers, ProbeFailure> {
        self.raw
            .as_ref()
            .ok_or_else(|| ProbeFailure::Fault(format!("{kind} probes require raw sockets (run as root)")))
    }

    async fn liveness(&self, addr: IpAddr, budget: Duration) -> ProbeOutcome {
        match (&self.raw, addr) {
            (Some(raw), IpAddr::V4(v4)) => {
                let started = Instant::now();
                let ttl = raw.ping.ping(v4, budget).await?;
                Ok(ProbeResponse::new(started.elapsed()).with_stack(Some(ttl), None))
            }
            _ => tcp::handshake_probe(SocketAddr::new(addr, self.liveness_port), budget).await,
        }
    }

    async fn half_open(&self, addr: SocketAddr, kind: ProbeKind, budget: Duration) -> ProbeOutcome {
        let raw = self.raw(kind)?;
        let target = match addr.ip() {
            IpAddr::V4(v4) => v4,
            IpAddr::V6(_) if kind == ProbeKind::TcpSyn => return tcp::connect_probe(addr, budget).await,
            IpAddr::V6(_) => return Err(ProbeFailure::Unreachable),
        };

        let started = Instant::now();
        let observation = raw.syn.probe(target, addr.port(), budget).await?;
        let (state, window) = match observation.reply {
            SynReply::Open { window } => (PortState::Open, Some(window)),
            SynReply::Closed { .. } => (PortState::Closed, None),
        };
        Ok(ProbeResponse::new(started.elapsed())
            .with_state(state)
            .with_stack(Some(observation.ttl), window))
    }
}

fn require_port(target: ProbeTarget, kind: ProbeKind) -> Result<SocketAddr, ProbeFailure> {
    target
        .socket_addr()
        .ok_or_else(|| ProbeFailure::Fault(format!("{kind} probe of {target} needs a port")))
}

#[async_trait]
impl ProbeExecutor for NetProbeExecutor {
    async fn probe(&self, target: ProbeTarget, kind: ProbeKind, timeout: Duration) -> ProbeOutcome {
        match kind {
            ProbeKind::Liveness => self.liveness(target.addr, timeout).await,
            ProbeKind::TcpConnect => tcp::connect_probe(require_port(target, kind)?, timeout).await,
            ProbeKind::Banner => tcp::banner_probe(require_port(target, kind)?, timeout).await,
            ProbeKind::UdpProbe => udp::udp_probe(require_port(target, kind)?, timeout).await,
            ProbeKind::TcpSyn | ProbeKind::OsFingerprint => {
                self.half_open(require_port(target, kind)?, kind, timeout).await
            }
        }
    }

    fn supports(&self, kind: ProbeKind) -> bool {
        match kind {
            ProbeKind::TcpSyn | ProbeKind::OsFingerprint => self.raw.is_some(),
            _ => true,
        }
    }

    fn neighbor_mac(&self, ip: IpAddr) -> Option<MacAddr> {
        interface::local_mac(ip).or_else(|| arp::neighbor_mac(ip))
    }

    async fn resolve_hostname(&self, ip: IpAddr, timeout: Duration) -> Option<String> {
        let nameserver = self.nameserver?;
        match resolver::reverse_lookup(nameserver, ip, timeout).await {
            Ok(name) => name,
            Err(e) => {
                debug!("reverse lookup of {ip} failed: {e}");
                None
            }
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
