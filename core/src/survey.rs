//! # Wireless and IoT Survey
//!
//! Two independent halves: the wireless side asks the platform which access
//! points are in range, the IoT side classifies hosts the engine has already
//! scanned. [`crate::ScanEngine`] runs both concurrently.

use std::collections::BTreeMap;
use std::sync::Arc;

use netsurvey_common::network::host::Host;
use netsurvey_common::signatures::SignatureTable;
use netsurvey_common::wireless::{IoTDevice, WirelessNetwork, WirelessScanner};
use tracing::{debug, warn};

use crate::iot::IotClassifier;

/// A scanned host together with the banners its services sent.
#[derive(Debug, Clone, PartialEq)]
pub struct HostReport {
    pub host: Host,
    pub banners: BTreeMap<u16, String>,
}

pub struct Surveyor {
    wireless: Arc<dyn WirelessScanner>,
    classifier: IotClassifier,
    local_scope: Option<String>,
}

impl Surveyor {
    pub fn new(
        wireless: Arc<dyn WirelessScanner>,
        signatures: Arc<SignatureTable>,
        local_scope: Option<String>,
    ) -> Self {
        Self {
            wireless,
            classifier: IotClassifier::new(signatures),
            local_scope,
        }
    }

    pub async fn wireless_networks(&self) -> Vec<WirelessNetwork> {
        let networks = self.wireless.scan_networks().await;
        debug!(count = networks.len(), "wireless networks in range");
        networks
    }

    /// The range to survey: the requested one, else the local scope.
    pub fn scope<'a>(&'a self, requested: Option<&'a str>) -> Option<&'a str> {
        let scope = requested.or(self.local_scope.as_deref());
        if scope.is_none() {
            warn!("no range given and no local network detected, skipping IoT classification");
        }
        scope
    }

    /// IoT devices among `reports`, ordered by address.
    pub fn classify(&self, reports: &[HostReport]) -> Vec<IoTDevice> {
        let mut devices: Vec<IoTDevice> = reports
            .iter()
            .filter(|report| report.host.is_up())
            .filter_map(|report| self.classifier.classify(&report.host, &report.banners))
            .collect();
        devices.sort_by_key(|device| device.ip);
        devices
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
