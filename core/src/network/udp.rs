use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use netsurvey_common::error::ProbeFailure;
use netsurvey_common::network::host::PortState;
use netsurvey_common::probe::{ProbeOutcome, ProbeResponse};
use netsurvey_protocols::payloads;
use tokio::net::UdpSocket;
use tokio::time::{self, Instant};

use super::io_failure;

const MAX_DATAGRAM_LEN: usize = 1500;

/// Sends a service-specific payload and waits for any datagram back.
///
/// An ICMP port-unreachable surfaces as a refused connection and marks the
/// port closed. Silence is a timeout.
pub async fn udp_probe(addr: SocketAddr, budget: Duration) -> ProbeOutcome {
    let started = Instant::now();
    let bind: SocketAddr = match addr {
        SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
        SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
    };
    let socket = UdpSocket::bind(bind)
        .await
        .map_err(|e| ProbeFailure::Fault(format!("binding udp socket: {e}")))?;
    socket.connect(addr).await.map_err(|e| io_failure(&e))?;

    let closed = || Ok(ProbeResponse::new(started.elapsed()).with_state(PortState::Closed));
    match socket.send(&payloads::udp_payload(addr.port())).await {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::ConnectionRefused => return closed(),
        Err(e) => return Err(io_failure(&e)),
    }

    let mut buffer = vec![0u8; MAX_DATAGRAM_LEN];
    let remaining = budget.saturating_sub(started.elapsed());
    match time::timeout(remaining, socket.recv(&mut buffer)).await {
        Ok(Ok(n)) => Ok(ProbeResponse::new(started.elapsed())
            .with_state(PortState::Open)
            .with_banner(buffer[..n].to_vec())),
        Ok(Err(e)) if e.kind() == io::ErrorKind::ConnectionRefused => closed(),
        Ok(Err(e)) => Err(io_failure(&e)),
        Err(_elapsed) => Err(ProbeFailure::Timeout),
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
