//! # Error Taxonomy
//!
//! Two layers of failure exist in a scan:
//!
//! * [`ProbeFailure`]: the outcome of a single probe. `Timeout` and `Unreachable` are
//!   folded into host/port state by the components that issued the probe. Only
//!   `Fault` escapes, converted into [`ScanError::ExecutorFault`].
//! * [`ScanError`]: what a caller of the scanning operations can observe.

use thiserror::Error;

/// Errors surfaced by the scanning operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// The requested network range could not be parsed or is too large.
    #[error("invalid network range '{range}': {reason}")]
    InvalidRange { range: String, reason: String },

    /// The requested scan type is not one of `quick` or `full`.
    #[error("invalid scan type '{0}' (expected 'quick' or 'full')")]
    InvalidScanType(String),

    /// The probing mechanism itself cannot run (missing privileges, socket exhaustion, ...).
    #[error("scanner cannot run: {0}")]
    ExecutorFault(String),

    /// Configuration or signature table could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ScanError {
    pub fn invalid_range(range: &str, reason: impl Into<String>) -> Self {
        Self::InvalidRange {
            range: range.to_string(),
            reason: reason.into(),
        }
    }
}

/// Failure signal of a single probe.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeFailure {
    /// No response within the probe budget.
    #[error("probe timed out")]
    Timeout,

    /// The target cannot be routed to.
    #[error("target unreachable")]
    Unreachable,

    /// The executor failed; this aborts the enclosing scan.
    #[error("probe executor fault: {0}")]
    Fault(String),
}

impl ProbeFailure {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fault(_))
    }
}

impl From<ProbeFailure> for ScanError {
    fn from(failure: ProbeFailure) -> Self {
        match failure {
            ProbeFailure::Fault(reason) => ScanError::ExecutorFault(reason),
            other => ScanError::ExecutorFault(format!("unexpected probe failure: {other}")),
        }
    }
}

pub type ScanResult<T> = Result<T, ScanError>;

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
