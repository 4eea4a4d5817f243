use netsurvey_common::scanning::NetworkScanner;
use netsurvey_common::wireless::WirelessIoTScan;
use netsurvey_core::ScanEngine;
use tracing::Instrument;

use crate::terminal::{format, print, spinner};

pub async fn wireless(engine: &ScanEngine, range: Option<&str>, json: bool) -> anyhow::Result<()> {
    let message = match range {
        Some(range) => format!("Surveying wireless networks and IoT devices in {range}"),
        None => "Surveying wireless networks and local IoT devices".to_string(),
    };
    let survey: WirelessIoTScan = engine
        .scan_wireless_iot(range)
        .instrument(spinner::running(message))
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&survey)?);
        return Ok(());
    }

    print::header("wireless networks");
    if survey.wireless_networks.is_empty() {
        print::print_status("no access points in range (or no wireless hardware)");
    }
    for (idx, network) in survey.wireless_networks.iter().enumerate() {
        let name = if network.ssid.is_empty() { "<hidden>" } else { network.ssid.as_str() };
        print::tree_head(idx, name);
        print::as_tree_one_level(format::network_details(network));
    }

    print::header("iot devices");
    if survey.iot_devices.is_empty() {
        print::no_results();
    }
    for (idx, device) in survey.iot_devices.iter().enumerate() {
        let title = device.hostname.clone().unwrap_or_else(|| device.ip.to_string());
        print::tree_head(idx, &title);
        print::as_tree_one_level(format::device_details(device));
    }
    print::fat_separator();
    Ok(())
}
