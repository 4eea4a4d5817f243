//! # OS and Vendor Fingerprinting
//!
//! Pure inference over evidence collected by earlier probes. Nothing here
//! touches the network, blocks or fails.

use std::net::IpAddr;
use std::sync::Arc;

use netsurvey_common::signatures::SignatureTable;
use netsurvey_common::vendors::{self, VendorRepository};
use pnet::util::MacAddr;
use tracing::trace;

/// Observations about one host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Evidence {
    pub ttl: Option<u8>,
    pub window_size: Option<u16>,
    pub mac: Option<MacAddr>,
}

pub struct Fingerprinter {
    signatures: Arc<SignatureTable>,
    vendors: Arc<dyn VendorRepository>,
}

impl Fingerprinter {
    pub fn new(signatures: Arc<SignatureTable>, vendors: Arc<dyn VendorRepository>) -> Self {
        Self { signatures, vendors }
    }

    /// Returns `(os, vendor)`.
    pub fn fingerprint(&self, ip: IpAddr, evidence: &Evidence) -> (Option<String>, Option<String>) {
        let os = evidence.ttl.and_then(|ttl| self.match_os(ttl, evidence.window_size));
        let vendor = evidence.mac.and_then(|mac| self.vendor(mac));
        trace!(%ip, ?evidence, ?os, ?vendor, "fingerprint");
        (os, vendor)
    }

    fn match_os(&self, observed_ttl: u8, window: Option<u16>) -> Option<String> {
        let initial = initial_ttl(observed_ttl);
        self.signatures
            .os
            .iter()
            .find(|sig| {
                sig.initial_ttl == initial
                    && (sig.window_sizes.is_empty()
                        || window.is_some_and(|w| sig.window_sizes.contains(&w)))
            })
            .map(|sig| sig.name.clone())
    }

    fn vendor(&self, mac: MacAddr) -> Option<String> {
        if mac == MacAddr::zero() || mac == MacAddr::broadcast() {
            return None;
        }
        self.signatures
            .vendor_for_prefix(&vendors::oui_prefix(mac))
            .map(str::to_string)
            .or_else(|| self.vendors.get_vendor(mac))
    }
}

/// The TTL a host most likely started with: the observed value rounded up to
/// the nearest common initial TTL.
pub fn initial_ttl(observed: u8) -> u8 {
    match observed {
        0..=32 => 32,
        33..=64 => 64,
        65..=128 => 128,
        _ => 255,
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
