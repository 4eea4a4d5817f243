//! # Probe Pool
//!
//! The single gate every probe of the process passes through. It owns the
//! global in-flight limit and enforces both the per-kind probe budget and the
//! deadline of the scan that issued the probe.

use std::sync::Arc;

use netsurvey_common::config::ProbeTimeouts;
use netsurvey_common::error::ProbeFailure;
use netsurvey_common::probe::{ProbeExecutor, ProbeKind, ProbeOutcome, ProbeTarget};
use tokio::sync::Semaphore;
use tokio::time::{self, Instant};
use tracing::trace;

pub struct ProbePool {
    executor: Arc<dyn ProbeExecutor>,
    permits: Arc<Semaphore>,
    max_in_flight: usize,
    timeouts: ProbeTimeouts,
}

impl ProbePool {
    pub fn new(executor: Arc<dyn ProbeExecutor>, max_in_flight: usize, timeouts: ProbeTimeouts) -> Self {
        let max_in_flight = max_in_flight.max(1);
        Self {
            executor,
            permits: Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight,
            timeouts,
        }
    }

    pub fn executor(&self) -> &Arc<dyn ProbeExecutor> {
        &self.executor
    }

    pub fn timeouts(&self) -> &ProbeTimeouts {
        &self.timeouts
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    /// Probes currently holding a permit.
    pub fn in_flight(&self) -> usize {
        self.max_in_flight - self.permits.available_permits()
    }

    /// Issues one probe once a permit is free.
    ///
    /// Waiting for the permit and the probe itself both end at `deadline`;
    /// running out of time is reported as [`ProbeFailure::Timeout`].
    pub async fn probe(&self, target: ProbeTarget, kind: ProbeKind, deadline: Instant) -> ProbeOutcome {
        if kind.needs_port() && target.port.is_none() {
            return Err(ProbeFailure::Fault(format!("{kind} probe of {target} needs a port")));
        }
        let _permit = match time::timeout_at(deadline, self.permits.acquire()).await {
            Ok(Ok(permit)) => permit,
            Ok(Err(_closed)) => return Err(ProbeFailure::Fault("probe pool is closed".into())),
            Err(_elapsed) => {
                trace!(%target, %kind, "deadline reached while waiting for a probe slot");
                return Err(ProbeFailure::Timeout);
            }
        };

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(ProbeFailure::Timeout);
        }
        let budget = self.timeouts.for_kind(kind).min(remaining);

        match time::timeout(budget, self.executor.probe(target, kind, budget)).await {
            Ok(outcome) => outcome,
            Err(_elapsed) => Err(ProbeFailure::Timeout),
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
