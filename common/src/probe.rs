//! # Probe Executor Port
//!
//! The lowest layer of the engine: one call, one network probe. Implementations
//! never retry; retry policy belongs to the callers.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use pnet::util::MacAddr;

use crate::error::ProbeFailure;
use crate::network::host::PortState;

/// The kind of probe to issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeKind {
    /// Does the host answer at all?
    Liveness,
    /// Full TCP handshake against a port.
    TcpConnect,
    /// Half-open SYN probe against a port. Needs raw sockets.
    TcpSyn,
    /// UDP datagram probe against a port.
    UdpProbe,
    /// SYN exchange that records TTL and window size. Needs raw sockets.
    OsFingerprint,
    /// Connect and read (or solicit) the service greeting.
    Banner,
}

impl ProbeKind {
    pub const ALL: [ProbeKind; 6] = [
        ProbeKind::Liveness,
        ProbeKind::TcpConnect,
        ProbeKind::TcpSyn,
        ProbeKind::UdpProbe,
        ProbeKind::OsFingerprint,
        ProbeKind::Banner,
    ];

    /// Whether this kind targets a specific port.
    pub fn needs_port(self) -> bool {
        !matches!(self, ProbeKind::Liveness)
    }
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProbeKind::Liveness => "liveness",
            ProbeKind::TcpConnect => "tcp_connect",
            ProbeKind::TcpSyn => "tcp_syn",
            ProbeKind::UdpProbe => "udp_probe",
            ProbeKind::OsFingerprint => "os_fingerprint",
            ProbeKind::Banner => "banner",
        };
        f.write_str(name)
    }
}

/// Address of a probe: an IP, optionally with a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProbeTarget {
    pub addr: IpAddr,
    pub port: Option<u16>,
}

impl ProbeTarget {
    pub fn host(addr: IpAddr) -> Self {
        Self { addr, port: None }
    }

    pub fn port(addr: IpAddr, port: u16) -> Self {
        Self {
            addr,
            port: Some(port),
        }
    }

    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.port.map(|port| SocketAddr::new(self.addr, port))
    }
}

impl fmt::Display for ProbeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.socket_addr() {
            Some(sock) => write!(f, "{sock}"),
            None => write!(f, "{}", self.addr),
        }
    }
}

/// Raw data returned by a successful probe. Fields the probe kind cannot
/// observe stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeResponse {
    pub rtt: Duration,
    pub ttl: Option<u8>,
    pub window_size: Option<u16>,
    pub banner: Option<Vec<u8>>,
    /// Set by port-level probes.
    pub port_state: Option<PortState>,
}

impl ProbeResponse {
    pub fn new(rtt: Duration) -> Self {
        Self {
            rtt,
            ..Self::default()
        }
    }

    pub fn with_state(mut self, state: PortState) -> Self {
        self.port_state = Some(state);
        self
    }

    pub fn with_banner(mut self, banner: Vec<u8>) -> Self {
        if !banner.is_empty() {
            self.banner = Some(banner);
        }
        self
    }

    pub fn with_stack(mut self, ttl: Option<u8>, window_size: Option<u16>) -> Self {
        self.ttl = ttl;
        self.window_size = window_size;
        self
    }

    /// The banner decoded as text, trimmed.
    pub fn banner_text(&self) -> Option<String> {
        self.banner
            .as_deref()
            .map(|bytes| String::from_utf8_lossy(bytes).trim().to_string())
            .filter(|text| !text.is_empty())
    }
}

pub type ProbeOutcome = Result<ProbeResponse, ProbeFailure>;

/// Issues single network probes.
#[async_trait]
pub trait ProbeExecutor: Send + Sync {
    /// Emits exactly one probe and waits at most `timeout` for the answer.
    async fn probe(&self, target: ProbeTarget, kind: ProbeKind, timeout: Duration) -> ProbeOutcome;

    /// Whether this executor can issue `kind` at all (e.g. raw sockets available).
    fn supports(&self, _kind: ProbeKind) -> bool {
        true
    }

    /// MAC address of `ip` when it sits on a directly attached segment.
    fn neighbor_mac(&self, _ip: IpAddr) -> Option<MacAddr> {
        None
    }

    /// Reverse DNS name of `ip`.
    async fn resolve_hostname(&self, _ip: IpAddr, _timeout: Duration) -> Option<String> {
        None
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
    use std::net::Ipv4Addr;

    #[test]
    fn banner_text_is_trimmed_and_lossy() {
        let response = ProbeResponse::new(Duration::from_millis(3))
            .with_banner(b"SSH-2.0-OpenSSH_9.6\r\n".to_vec());
        assert_eq!(response.banner_text().as_deref(), Some("SSH-2.0-OpenSSH_9.6"));

        let empty = ProbeResponse::new(Duration::ZERO).with_banner(Vec::new());
        assert_eq!(empty.banner, None);
    }

    #[test]
    fn target_display() {
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(ProbeTarget::host(ip).to_string(), "10.0.0.1");
        assert_eq!(ProbeTarget::port(ip, 22).to_string(), "10.0.0.1:22");
    }
}
