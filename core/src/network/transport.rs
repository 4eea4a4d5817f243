use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use pnet::packet::ip::IpNextHeaderProtocol;
use pnet::packet::ipv4::Ipv4Packet;
use pnet::transport::{
    self, TransportChannelType, TransportProtocol, TransportSender, ipv4_packet_iter,
};
use tokio::sync::oneshot;
use tracing::warn;

const TRANSPORT_BUFFER_SIZE: usize = 4096;
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Raw IPv4 sender for `protocol`. The kernel writes the IP header.
pub fn open_sender(protocol: IpNextHeaderProtocol) -> anyhow::Result<TransportSender> {
    let channel_type = TransportChannelType::Layer4(TransportProtocol::Ipv4(protocol));
    let (tx, _rx) = transport::transport_channel(TRANSPORT_BUFFER_SIZE, channel_type)?;
    Ok(tx)
}

/// Hands every IPv4 packet of `protocol` reaching this host to `on_packet`,
/// on a dedicated thread, until `running` is cleared.
pub fn spawn_capture<F>(
    name: &str,
    protocol: IpNextHeaderProtocol,
    running: Arc<AtomicBool>,
    mut on_packet: F,
) -> anyhow::Result<()>
where
    F: FnMut(&Ipv4Packet) + Send + 'static,
{
    let (_tx, mut rx) =
        transport::transport_channel(TRANSPORT_BUFFER_SIZE, TransportChannelType::Layer3(protocol))?;

    std::thread::Builder::new().name(name.to_string()).spawn(move || {
        let mut packets = ipv4_packet_iter(&mut rx);
        while running.load(Ordering::Relaxed) {
            match packets.next_with_timeout(POLL_INTERVAL) {
                Ok(Some((packet, _source))) => on_packet(&packet),
                Ok(None) => {}
                Err(e) => {
                    warn!("raw capture stopped: {e}");
                    break;
                }
            }
        }
    })?;
    Ok(())
}

/// Outstanding probes waiting for a reply from the capture thread.
pub struct Pending<K, V> {
    waiting: Arc<Mutex<HashMap<K, oneshot::Sender<V>>>>,
}

impl<K, V> Clone for Pending<K, V> {
    fn clone(&self) -> Self {
        Self {
            waiting: Arc::clone(&self.waiting),
        }
    }
}

impl<K, V> Default for Pending<K, V> {
    fn default() -> Self {
        Self {
            waiting: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K: Eq + Hash, V> Pending<K, V> {
    fn lock(&self) -> MutexGuard<'_, HashMap<K, oneshot::Sender<V>>> {
        self.waiting.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(&self, key: K) -> oneshot::Receiver<V> {
        let (tx, rx) = oneshot::channel();
        self.lock().insert(key, tx);
        rx
    }

    /// Delivers `value` to whoever registered `key`; false if nobody did.
    pub fn complete(&self, key: &K, value: V) -> bool {
        match self.lock().remove(key) {
            Some(tx) => tx.send(value).is_ok(),
            None => false,
        }
    }

    pub fn cancel(&self, key: &K) {
        self.lock().remove(key);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
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
