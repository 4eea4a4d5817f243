//! # Host Discovery
//!
//! Sweeps every address of a range with liveness probes. An address is up as
//! soon as one probe succeeds; a timeout is retried a bounded number of times,
//! anything else means down.

use std::net::IpAddr;
use std::sync::Arc;

use futures::{FutureExt, StreamExt, TryStreamExt, stream};
use netsurvey_common::error::ProbeFailure;
use netsurvey_common::network::target::NetworkRange;
use netsurvey_common::probe::{ProbeKind, ProbeTarget};
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::pool::ProbePool;

pub struct HostDiscoverer {
    pool: Arc<ProbePool>,
    fanout: usize,
    retries: u8,
}

impl HostDiscoverer {
    pub fn new(pool: Arc<ProbePool>, fanout: usize, retries: u8) -> Self {
        Self {
            pool,
            fanout: fanout.max(1),
            retries,
        }
    }

    /// Responsive addresses of `range`, in no particular order.
    ///
    /// Fails only when the executor faults; the sweep stops at the first fault.
    pub async fn discover(&self, range: &NetworkRange, deadline: Instant) -> Result<Vec<IpAddr>, ProbeFailure> {
        let alive: Vec<Option<IpAddr>> = stream::iter(range.addresses().iter().copied())
            .map(|ip| self.is_alive(ip, deadline).boxed())
            .buffer_unordered(self.fanout)
            .try_collect()
            .await?;

        let alive: Vec<IpAddr> = alive.into_iter().flatten().collect();
        debug!(range = %range, probed = range.len(), alive = alive.len(), "discovery sweep finished");
        Ok(alive)
    }

    async fn is_alive(&self, ip: IpAddr, deadline: Instant) -> Result<Option<IpAddr>, ProbeFailure> {
        let target = ProbeTarget::host(ip);
        let mut attempts: u8 = 0;
        loop {
            match self.pool.probe(target, ProbeKind::Liveness, deadline).await {
                Ok(response) => {
                    trace!(%ip, rtt_ms = response.rtt.as_millis() as u64, "host answered");
                    return Ok(Some(ip));
                }
                Err(ProbeFailure::Timeout) if attempts < self.retries && Instant::now() < deadline => {
                    attempts += 1;
                }
                Err(ProbeFailure::Fault(reason)) => return Err(ProbeFailure::Fault(reason)),
                Err(_) => return Ok(None),
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
