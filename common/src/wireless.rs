//! # Wireless and IoT Models
//!
//! Results of the wireless/IoT survey and the port to the platform's wireless
//! tooling.

use std::net::IpAddr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::network::host::Port;

/// A nearby access point.
///
/// `signal` is always expressed in dBm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WirelessNetwork {
    pub ssid: String,
    pub bssid: Option<String>,
    pub signal: Option<i32>,
    pub channel: Option<u32>,
    pub security: Option<String>,
}

/// A host classified as an IoT device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IoTDevice {
    pub ip: IpAddr,
    pub hostname: Option<String>,
    pub vendor: Option<String>,
    pub os: Option<String>,
    pub ports: Vec<Port>,
    /// In `(0.0, 1.0]`.
    pub confidence: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WirelessIoTScan {
    pub wireless_networks: Vec<WirelessNetwork>,
    pub iot_devices: Vec<IoTDevice>,
    /// `None` when the survey ran against the local scope instead of a requested range.
    pub network_range: Option<String>,
    pub scanned_at: DateTime<Utc>,
}

/// Enumerates access points in radio range.
///
/// Implementations report a missing wireless capability as an empty list.
#[async_trait]
pub trait WirelessScanner: Send + Sync {
    async fn scan_networks(&self) -> Vec<WirelessNetwork>;
}

/// A scanner for machines without wireless hardware.
pub struct NoWireless;

#[async_trait]
impl WirelessScanner for NoWireless {
    async fn scan_networks(&self) -> Vec<WirelessNetwork> {
        Vec::new()
    }
}
