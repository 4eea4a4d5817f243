use std::fmt;

use netsurvey_common::error::ScanError;
use tokio::time::Instant;
use tracing::{error, info};

/// Lifecycle of one network scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Started,
    Discovering,
    PerHostScanning,
    Aggregating,
    Completed,
    Failed,
}

impl ScanPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, ScanPhase::Completed | ScanPhase::Failed)
    }

    /// Phases only move forward; `Failed` is reachable from any phase that is not terminal.
    pub fn can_advance_to(self, next: ScanPhase) -> bool {
        use ScanPhase::*;
        matches!(
            (self, next),
            (Started, Discovering)
                | (Discovering, PerHostScanning)
                | (PerHostScanning, Aggregating)
                | (Aggregating, Completed)
        ) || (next == Failed && !self.is_terminal())
    }
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScanPhase::Started => "started",
            ScanPhase::Discovering => "discovering",
            ScanPhase::PerHostScanning => "per-host scanning",
            ScanPhase::Aggregating => "aggregating",
            ScanPhase::Completed => "completed",
            ScanPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Tracks and logs the phase transitions of a scan.
pub struct PhaseTracker {
    scan_id: String,
    phase: ScanPhase,
    started: Instant,
}

impl PhaseTracker {
    pub fn start(scan_id: &str) -> Self {
        info!(scan_id, phase = %ScanPhase::Started, "scan started");
        Self {
            scan_id: scan_id.to_string(),
            phase: ScanPhase::Started,
            started: Instant::now(),
        }
    }

    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    pub fn advance(&mut self, next: ScanPhase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "illegal scan phase transition {} -> {}",
            self.phase,
            next
        );
        info!(
            scan_id = %self.scan_id,
            from = %self.phase,
            to = %next,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "scan phase"
        );
        self.phase = next;
    }

    /// Moves to [`ScanPhase::Failed`] and hands the error back.
    pub fn fail(&mut self, err: impl Into<ScanError>) -> ScanError {
        let err = err.into();
        error!(scan_id = %self.scan_id, during = %self.phase, "scan failed: {err}");
        self.phase = ScanPhase::Failed;
        err
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
