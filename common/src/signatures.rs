//! # Signature Tables
//!
//! Domain knowledge used by the fingerprinter and the IoT classifier, kept as
//! data so it can be versioned and replaced (TOML) without touching the engine.
//!
//! IoT scoring weights of the built-in table (version `2026.1`):
//!
//! | signal                                   | weight          |
//! |------------------------------------------|-----------------|
//! | vendor matches the IoT manufacturer list | 0.40            |
//! | characteristic IoT port open             | per port (0.10 – 0.30) |
//! | embedded-device banner keyword           | 0.25            |
//! | no general-purpose OS port open          | 0.10            |
//!
//! A host is reported as IoT when the summed confidence exceeds `0.30`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ScanError, ScanResult};
use crate::network::host::Protocol;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignatureTable {
    pub version: String,
    #[serde(default)]
    pub os: Vec<OsSignature>,
    #[serde(default)]
    pub oui: Vec<OuiEntry>,
    pub iot: IotRules,
}

/// Matches when the inferred initial TTL is equal and, if `window_sizes` is
/// not empty, the observed window size is listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OsSignature {
    pub name: String,
    pub initial_ttl: u8,
    #[serde(default)]
    pub window_sizes: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OuiEntry {
    /// `"AA:BB:CC"`.
    pub prefix: String,
    pub vendor: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IotPort {
    pub port: u16,
    #[serde(default = "default_protocol")]
    pub protocol: Protocol,
    pub label: String,
    pub weight: f64,
}

fn default_protocol() -> Protocol {
    Protocol::Tcp
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IotRules {
    pub threshold: f64,
    pub vendor_weight: f64,
    /// Lowercase substrings matched against the vendor name.
    pub vendors: Vec<String>,
    pub ports: Vec<IotPort>,
    pub banner_weight: f64,
    /// Lowercase substrings matched against banner text.
    pub banner_keywords: Vec<String>,
    pub no_general_purpose_weight: f64,
    pub general_purpose_ports: Vec<u16>,
}

impl SignatureTable {
    pub fn from_toml_str(raw: &str) -> ScanResult<Self> {
        let table: SignatureTable =
            toml::from_str(raw).map_err(|e| ScanError::Config(format!("signature table: {e}")))?;
        table.validate()?;
        Ok(table)
    }

    pub fn load(path: &Path) -> ScanResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ScanError::Config(format!("reading {}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    fn validate(&self) -> ScanResult<()> {
        let weights = [
            self.iot.threshold,
            self.iot.vendor_weight,
            self.iot.banner_weight,
            self.iot.no_general_purpose_weight,
        ];
        let port_weights = self.iot.ports.iter().map(|p| p.weight);
        if weights
            .into_iter()
            .chain(port_weights)
            .any(|w| !(0.0..=1.0).contains(&w))
        {
            return Err(ScanError::Config(
                "signature table weights must lie in [0, 1]".into(),
            ));
        }
        Ok(())
    }

    /// Vendor listed for an OUI prefix (`"AA:BB:CC"`, case-insensitive).
    pub fn vendor_for_prefix(&self, prefix: &str) -> Option<&str> {
        self.oui
            .iter()
            .find(|entry| entry.prefix.eq_ignore_ascii_case(prefix))
            .map(|entry| entry.vendor.as_str())
    }

    /// The table shipped with the binary.
    pub fn builtin() -> Self {
        Self {
            version: "2026.1".to_string(),
            os: vec![
                os("Linux", 64, &[5840, 14600, 29200, 64240, 65483]),
                os("macOS/BSD", 64, &[65535]),
                os("Windows", 128, &[8192, 16384, 64240, 65535]),
                os("Cisco IOS", 255, &[4128]),
                os("Windows", 128, &[]),
                os("Linux/Unix", 64, &[]),
                os("Solaris/Network appliance", 255, &[]),
            ],
            oui: vec![
                oui("24:0A:C4", "Espressif Inc."),
                oui("30:AE:A4", "Espressif Inc."),
                oui("B8:27:EB", "Raspberry Pi Foundation"),
                oui("DC:A6:32", "Raspberry Pi Trading Ltd"),
                oui("18:B4:30", "Nest Labs Inc."),
                oui("00:17:88", "Philips Lighting BV"),
                oui("00:0E:58", "Sonos, Inc."),
                oui("44:19:B6", "Hangzhou Hikvision Digital Technology"),
                oui("24:A4:3C", "Ubiquiti Networks Inc."),
            ],
            iot: IotRules {
                threshold: 0.30,
                vendor_weight: 0.40,
                vendors: [
                    "espressif", "tuya", "shelly", "itead", "hikvision", "dahua", "axis communications",
                    "ezviz", "reolink", "wyze", "nest labs", "philips lighting", "signify", "sonos",
                    "roku", "amazon technologies", "xiaomi", "lifx", "ecobee", "belkin", "tp-link",
                    "raspberry pi",
                ]
                .into_iter()
                .map(String::from)
                .collect(),
                ports: vec![
                    iot_port(554, Protocol::Tcp, "rtsp", 0.30),
                    iot_port(1883, Protocol::Tcp, "mqtt", 0.30),
                    iot_port(2020, Protocol::Tcp, "onvif", 0.25),
                    iot_port(5683, Protocol::Udp, "coap", 0.30),
                    iot_port(6668, Protocol::Tcp, "tuya", 0.30),
                    iot_port(8008, Protocol::Tcp, "cast", 0.15),
                    iot_port(8009, Protocol::Tcp, "cast-tls", 0.15),
                    iot_port(8554, Protocol::Tcp, "rtsp-alt", 0.20),
                    iot_port(8883, Protocol::Tcp, "mqtt-tls", 0.30),
                    iot_port(9999, Protocol::Tcp, "tplink-smarthome", 0.20),
                    iot_port(1900, Protocol::Udp, "upnp", 0.15),
                    iot_port(49152, Protocol::Tcp, "upnp", 0.10),
                ],
                banner_weight: 0.25,
                banner_keywords: [
                    "goahead", "boa/", "mini_httpd", "uc-httpd", "lighttpd", "hikvision", "dahua",
                    "webcam", "ip camera", "netcam", "tasmota", "shelly", "esp8266", "esp32",
                    "mosquitto", "openwrt", "dvr", "nvr", "busybox", "rtsp/1.0",
                ]
                .into_iter()
                .map(String::from)
                .collect(),
                no_general_purpose_weight: 0.10,
                general_purpose_ports: vec![22, 135, 139, 445, 3389, 5900],
            },
        }
    }
}

impl Default for SignatureTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn os(name: &str, initial_ttl: u8, window_sizes: &[u16]) -> OsSignature {
    OsSignature {
        name: name.to_string(),
        initial_ttl,
        window_sizes: window_sizes.to_vec(),
    }
}

fn oui(prefix: &str, vendor: &str) -> OuiEntry {
    OuiEntry {
        prefix: prefix.to_string(),
        vendor: vendor.to_string(),
    }
}

fn iot_port(port: u16, protocol: Protocol, label: &str, weight: f64) -> IotPort {
    IotPort {
        port,
        protocol,
        label: label.to_string(),
        weight,
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
