use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use netsurvey_common::error::ProbeFailure;
use netsurvey_protocols::icmp as icmp_packet;
use pnet::packet::Packet;
use pnet::packet::icmp::IcmpPacket;
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::transport::TransportSender;
use tokio::time;

use super::io_failure;
use super::transport::{self, Pending};

/// ICMP echo over a raw socket. Replies are routed back by source address
/// and echo identifier, and resolve to the TTL they arrived with.
pub struct Pinger {
    sender: Mutex<TransportSender>,
    pending: Pending<(Ipv4Addr, u16), u8>,
    running: Arc<AtomicBool>,
    next_identifier: AtomicU16,
}

impl Pinger {
    pub fn open() -> anyhow::Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let pending: Pending<(Ipv4Addr, u16), u8> = Pending::default();

        let sink = pending.clone();
        transport::spawn_capture(
            "icmp-capture",
            IpNextHeaderProtocols::Icmp,
            Arc::clone(&running),
            move |packet| {
                let Some(message) = IcmpPacket::new(packet.payload()) else {
                    return;
                };
                if let Some(identifier) = icmp_packet::reply_identifier(&message) {
                    sink.complete(&(packet.get_source(), identifier), packet.get_ttl());
                }
            },
        )?;

        let sender = transport::open_sender(IpNextHeaderProtocols::Icmp)?;
        Ok(Self {
            sender: Mutex::new(sender),
            pending,
            running,
            next_identifier: AtomicU16::new(rand::random()),
        })
    }

    /// Sends one echo request and returns the reply's TTL.
    pub async fn ping(&self, target: Ipv4Addr, budget: Duration) -> Result<u8, ProbeFailure> {
        let identifier = self.next_identifier.fetch_add(1, Ordering::Relaxed);
        let key = (target, identifier);
        let request = icmp_packet::create_echo_request(identifier, 1)
            .map_err(|e| ProbeFailure::Fault(e.to_string()))?;

        let reply = self.pending.register(key);
        if let Err(failure) = self.send(&request, target) {
            self.pending.cancel(&key);
            return Err(failure);
        }

        match time::timeout(budget, reply).await {
            Ok(Ok(ttl)) => Ok(ttl),
            _ => {
                self.pending.cancel(&key);
                Err(ProbeFailure::Timeout)
            }
        }
    }

    fn send(&self, request: &[u8], target: Ipv4Addr) -> Result<(), ProbeFailure> {
        let packet = IcmpPacket::new(request)
            .ok_or_else(|| ProbeFailure::Fault("truncated echo request".to_string()))?;
        let mut sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        sender
            .send_to(packet, IpAddr::V4(target))
            .map(|_| ())
            .map_err(|e| io_failure(&e))
    }
}

impl Drop for Pinger {
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
    async fn loopback_answers_echo() {
        let pinger = Pinger::open().unwrap();
        let ttl = pinger.ping(Ipv4Addr::LOCALHOST, Duration::from_secs(1)).await.unwrap();
        assert_eq!(ttl, 64);
    }
}
