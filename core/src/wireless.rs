//! # System Wireless Scanner
//!
//! Lists access points through the platform tooling: NetworkManager's
//! `nmcli` first, `iw` as a fallback. Missing tools, missing hardware and
//! insufficient privileges all produce an empty list.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use netsurvey_common::wireless::{WirelessNetwork, WirelessScanner};
use tokio::process::Command;
use tokio::time;
use tracing::debug;

use crate::network::interface;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

pub struct SystemWirelessScanner {
    timeout: Duration,
}

impl Default for SystemWirelessScanner {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl SystemWirelessScanner {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn run(&self, program: &str, args: &[&str]) -> anyhow::Result<String> {
        let output = time::timeout(
            self.timeout,
            Command::new(program).args(args).kill_on_drop(true).output(),
        )
        .await
        .with_context(|| format!("{program} timed out"))?
        .with_context(|| format!("running {program}"))?;

        anyhow::ensure!(output.status.success(), "{program} exited with {}", output.status);
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn nmcli(&self) -> anyhow::Result<Vec<WirelessNetwork>> {
        let stdout = self
            .run(
                "nmcli",
                &["-t", "-f", "SSID,BSSID,CHAN,SIGNAL,SECURITY", "dev", "wifi", "list"],
            )
            .await?;
        Ok(parse_nmcli(&stdout))
    }

    async fn iw(&self, interface: &str) -> anyhow::Result<Vec<WirelessNetwork>> {
        let stdout = self.run("iw", &["dev", interface, "scan"]).await?;
        Ok(parse_iw_scan(&stdout))
    }
}

#[async_trait]
impl WirelessScanner for SystemWirelessScanner {
    async fn scan_networks(&self) -> Vec<WirelessNetwork> {
        match self.nmcli().await {
            Ok(networks) if !networks.is_empty() => return networks,
            Ok(_) => debug!("nmcli reported no access points"),
            Err(e) => debug!("nmcli unavailable: {e:#}"),
        }

        for name in interface::wireless_interfaces() {
            match self.iw(&name).await {
                Ok(networks) if !networks.is_empty() => return networks,
                Ok(_) => debug!("iw found no access points on {name}"),
                Err(e) => debug!("iw scan on {name} failed: {e:#}"),
            }
        }
        Vec::new()
    }
}

/// Parses `nmcli -t -f SSID,BSSID,CHAN,SIGNAL,SECURITY dev wifi list`.
///
/// Terse mode escapes `:` inside values (the BSSID) as `\:`. `SIGNAL` is a
/// percentage and is converted to dBm.
pub fn parse_nmcli(output: &str) -> Vec<WirelessNetwork> {
    let mut seen = HashSet::new();
    output
        .lines()
        .filter_map(|line| {
            let fields = split_terse(line);
            let [ssid, bssid, channel, signal, security] = fields.as_slice() else {
                return None;
            };
            let bssid = non_empty(bssid).map(|b| b.to_ascii_lowercase());
            if ssid.is_empty() && bssid.is_none() {
                return None;
            }
            Some(WirelessNetwork {
                ssid: ssid.clone(),
                bssid,
                signal: signal.trim().parse::<i32>().ok().map(percent_to_dbm),
                channel: channel.trim().parse().ok(),
                security: non_empty(security).filter(|s| s != "--"),
            })
        })
        .filter(|network| seen.insert(network.bssid.clone().unwrap_or_else(|| network.ssid.clone())))
        .collect()
}

/// Parses the output of `iw dev <if> scan`.
pub fn parse_iw_scan(output: &str) -> Vec<WirelessNetwork> {
    let mut networks = Vec::new();
    let mut current: Option<IwEntry> = None;

    for line in output.lines() {
        if let Some(rest) = line.strip_prefix("BSS ") {
            networks.extend(current.take().map(IwEntry::finish));
            let bssid = rest.split(['(', ' ']).next().unwrap_or_default();
            current = Some(IwEntry::new(bssid));
            continue;
        }
        let Some(entry) = current.as_mut() else {
            continue;
        };
        let line = line.trim();
        if let Some(ssid) = line.strip_prefix("SSID:") {
            entry.ssid = ssid.trim().to_string();
        } else if let Some(freq) = line.strip_prefix("freq:") {
            entry.channel = freq
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(|mhz| freq_to_channel(mhz as u32));
        } else if let Some(signal) = line.strip_prefix("signal:") {
            entry.signal = signal
                .split_whitespace()
                .next()
                .and_then(|dbm| dbm.parse::<f64>().ok())
                .map(|dbm| dbm.round() as i32);
        } else if line.starts_with("RSN:") {
            entry.rsn = true;
        } else if line.starts_with("WPA:") {
            entry.wpa = true;
        } else if line.starts_with("capability:") && line.contains("Privacy") {
            entry.privacy = true;
        }
    }
    networks.extend(current.map(IwEntry::finish));
    networks
}

struct IwEntry {
    bssid: String,
    ssid: String,
    channel: Option<u32>,
    signal: Option<i32>,
    rsn: bool,
    wpa: bool,
    privacy: bool,
}

impl IwEntry {
    fn new(bssid: &str) -> Self {
        Self {
            bssid: bssid.to_ascii_lowercase(),
            ssid: String::new(),
            channel: None,
            signal: None,
            rsn: false,
            wpa: false,
            privacy: false,
        }
    }

    fn finish(self) -> WirelessNetwork {
        let security = match (self.rsn, self.wpa, self.privacy) {
            (true, true, _) => Some("WPA/WPA2"),
            (true, false, _) => Some("WPA2"),
            (false, true, _) => Some("WPA"),
            (false, false, true) => Some("WEP"),
            (false, false, false) => None,
        };
        WirelessNetwork {
            ssid: self.ssid,
            bssid: non_empty(&self.bssid),
            signal: self.signal,
            channel: self.channel,
            security: security.map(String::from),
        }
    }
}

/// IEEE 802.11 channel number for a centre frequency in MHz.
pub fn freq_to_channel(mhz: u32) -> Option<u32> {
    match mhz {
        2484 => Some(14),
        2412..=2472 => Some((mhz - 2407) / 5),
        5160..=5885 => Some((mhz - 5000) / 5),
        5955..=7115 => Some((mhz - 5950) / 5),
        _ => None,
    }
}

/// NetworkManager's signal quality (0-100) as an approximate dBm value.
pub fn percent_to_dbm(percent: i32) -> i32 {
    percent.clamp(0, 100) / 2 - 100
}

fn split_terse(line: &str) -> Vec<String> {
    let mut fields = vec![String::new()];
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let (Some(next), Some(field)) = (chars.next(), fields.last_mut()) {
                    field.push(next);
                }
            }
            ':' => fields.push(String::new()),
            _ => {
                if let Some(field) = fields.last_mut() {
                    field.push(c);
                }
            }
        }
    }
    fields
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
