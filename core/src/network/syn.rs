use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use netsurvey_common::error::ProbeFailure;
use netsurvey_protocols::tcp::{self as tcp_packet, SynReply};
use pnet::packet::Packet;
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::tcp::TcpPacket;
use pnet::transport::TransportSender;
use tokio::time;

use super::transport::{self, Pending};
use super::{interface, io_failure};

const EPHEMERAL_PORTS: std::ops::RangeInclusive<u16> = 49152..=65535;

/// What came back for one half-open probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynObservation {
    pub reply: SynReply,
    pub ttl: u8,
}

/// A reply is matched on the four-tuple and on acknowledging our sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SynKey {
    target: Ipv4Addr,
    target_port: u16,
    local_port: u16,
    ack: u32,
}

/// Half-open TCP scanner over a raw socket.
///
/// The kernel answers the SYN-ACK with a RST since it never saw our SYN, so
/// no connection is left behind.
pub struct SynProber {
    sender: Mutex<TransportSender>,
    pending: Pending<SynKey, SynObservation>,
    running: Arc<AtomicBool>,
}

impl SynProber {
    pub fn open() -> anyhow::Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let pending: Pending<SynKey, SynObservation> = Pending::default();

        let sink = pending.clone();
        transport::spawn_capture(
            "syn-capture",
            IpNextHeaderProtocols::Tcp,
            Arc::clone(&running),
            move |packet| {
                let Some(segment) = TcpPacket::new(packet.payload()) else {
                    return;
                };
                let key = SynKey {
                    target: packet.get_source(),
                    target_port: segment.get_source(),
                    local_port: segment.get_destination(),
                    ack: segment.get_acknowledgement(),
                };
                let sequence = key.ack.wrapping_sub(1);
                if let Some(reply) = tcp_packet::classify_reply(&segment, key.local_port, sequence) {
                    let ttl = packet.get_ttl();
                    sink.complete(&key, SynObservation { reply, ttl });
                }
            },
        )?;

        let sender = transport::open_sender(IpNextHeaderProtocols::Tcp)?;
        Ok(Self {
            sender: Mutex::new(sender),
            pending,
            running,
        })
    }

    pub async fn probe(&self, target: Ipv4Addr, port: u16, budget: Duration) -> Result<SynObservation, ProbeFailure> {
        let source = interface::route_source_v4(target).ok_or(ProbeFailure::Unreachable)?;
        let local_port = rand::random_range(EPHEMERAL_PORTS);
        let sequence: u32 = rand::random();
        let key = SynKey {
            target,
            target_port: port,
            local_port,
            ack: sequence.wrapping_add(1),
        };

        let segment = tcp_packet::create_syn_packet(source, target, local_port, port, sequence)
            .map_err(|e| ProbeFailure::Fault(e.to_string()))?;

        let reply = self.pending.register(key);
        if let Err(failure) = self.send(&segment, target) {
            self.pending.cancel(&key);
            return Err(failure);
        }

        match time::timeout(budget, reply).await {
            Ok(Ok(observation)) => Ok(observation),
            _ => {
                self.pending.cancel(&key);
                Err(ProbeFailure::Timeout)
            }
        }
    }

    fn send(&self, segment: &[u8], target: Ipv4Addr) -> Result<(), ProbeFailure> {
        let packet = TcpPacket::new(segment)
            .ok_or_else(|| ProbeFailure::Fault("truncated SYN segment".to_string()))?;
        let mut sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        sender
            .send_to(packet, IpAddr::V4(target))
            .map(|_| ())
            .map_err(|e| io_failure(&e))
    }
}

impl Drop for SynProber {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
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

    #[tokio::test]
    #[ignore]
    async fn listening_loopback_port_answers_syn_ack() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let prober = SynProber::open().unwrap();

        let observation = prober.probe(Ipv4Addr::LOCALHOST, port, Duration::from_secs(1)).await.unwrap();
        assert!(matches!(observation.reply, SynReply::Open { .. }));
    }
}
