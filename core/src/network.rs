//! Probe adapters backed by the host's network stack.

pub mod arp;
pub mod icmp;
pub mod interface;
pub mod resolver;
pub mod syn;
pub mod tcp;
pub mod transport;
pub mod udp;

use std::io;

use netsurvey_common::error::ProbeFailure;

const ENFILE: i32 = 23;
const EMFILE: i32 = 24;

/// Maps a socket error onto the probe failure it represents.
///
/// Running out of descriptors is a fault of the executor, not a property of
/// the target, and aborts the scan.
pub(crate) fn io_failure(err: &io::Error) -> ProbeFailure {
    if matches!(err.raw_os_error(), Some(EMFILE | ENFILE)) {
        return ProbeFailure::Fault(format!("socket exhaustion: {err}"));
    }
    match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ProbeFailure::Timeout,
        io::ErrorKind::OutOfMemory => ProbeFailure::Fault(err.to_string()),
        _ => ProbeFailure::Unreachable,
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

    #[test]
    fn descriptor_exhaustion_is_a_fault() {
        let err = io::Error::from_raw_os_error(EMFILE);
        assert!(io_failure(&err).is_fatal());
    }

    #[test]
    fn routing_errors_are_unreachable() {
        let err = io::Error::from(io::ErrorKind::HostUnreachable);
        assert_eq!(io_failure(&err), ProbeFailure::Unreachable);
        let err = io::Error::from(io::ErrorKind::TimedOut);
        assert_eq!(io_failure(&err), ProbeFailure::Timeout);
    }
}
