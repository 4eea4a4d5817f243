use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use netsurvey_common::error::ProbeFailure;
use netsurvey_common::network::host::PortState;
use netsurvey_common::probe::{ProbeOutcome, ProbeResponse};
use netsurvey_protocols::payloads;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpSocket, TcpStream};
use tokio::time::{self, Instant};

use super::io_failure;

const MAX_BANNER_LEN: usize = 1024;

/// Completes a handshake with `addr`. `Ok(None)` means the port refused.
pub async fn connect(addr: SocketAddr, budget: Duration) -> Result<Option<TcpStream>, ProbeFailure> {
    let socket = match addr {
        SocketAddr::V4(_) => TcpSocket::new_v4(),
        SocketAddr::V6(_) => TcpSocket::new_v6(),
    }
    .map_err(|e| ProbeFailure::Fault(format!("creating tcp socket: {e}")))?;

    match time::timeout(budget, socket.connect(addr)).await {
        Ok(Ok(stream)) => Ok(Some(stream)),
        Ok(Err(e)) if e.kind() == io::ErrorKind::ConnectionRefused => Ok(None),
        Ok(Err(e)) => Err(io_failure(&e)),
        Err(_elapsed) => Err(ProbeFailure::Timeout),
    }
}

/// Liveness without privileges: an accepted or refused handshake both prove
/// the host is there.
pub async fn handshake_probe(addr: SocketAddr, budget: Duration) -> ProbeOutcome {
    let started = Instant::now();
    connect(addr, budget).await?;
    Ok(ProbeResponse::new(started.elapsed()))
}

pub async fn connect_probe(addr: SocketAddr, budget: Duration) -> ProbeOutcome {
    let started = Instant::now();
    let state = match connect(addr, budget).await? {
        Some(_stream) => PortState::Open,
        None => PortState::Closed,
    };
    Ok(ProbeResponse::new(started.elapsed()).with_state(state))
}

/// Connects and collects whatever the service says.
///
/// Services that talk first (SSH, FTP, SMTP) are given a third of the budget
/// to greet; otherwise a protocol-appropriate request is sent and the reply
/// read with what is left.
pub async fn banner_probe(addr: SocketAddr, budget: Duration) -> ProbeOutcome {
    let started = Instant::now();
    let Some(mut stream) = connect(addr, budget).await? else {
        return Ok(ProbeResponse::new(started.elapsed()).with_state(PortState::Closed));
    };

    let mut buffer = vec![0u8; MAX_BANNER_LEN];
    let greeting_wait = budget.saturating_sub(started.elapsed()) / 3;
    let mut banner = read_some(&mut stream, &mut buffer, greeting_wait).await;

    if banner.is_empty() {
        let request = payloads::tcp_request(addr.port());
        if stream.write_all(request).await.is_ok() {
            let remaining = budget.saturating_sub(started.elapsed());
            banner = read_some(&mut stream, &mut buffer, remaining).await;
        }
    }

    Ok(ProbeResponse::new(started.elapsed())
        .with_state(PortState::Open)
        .with_banner(banner))
}

async fn read_some(stream: &mut TcpStream, buffer: &mut [u8], wait: Duration) -> Vec<u8> {
    match time::timeout(wait, stream.read(buffer)).await {
        Ok(Ok(n)) => buffer[..n].to_vec(),
        _ => Vec::new(),
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
