use std::net::{IpAddr, Ipv6Addr};

use colored::*;
use netsurvey_common::network::host::{Host, HostState, Port, PortState};
use netsurvey_common::wireless::{IoTDevice, WirelessNetwork};
use pnet::util::MacAddr;

use crate::terminal::colors;

pub type Detail = (String, ColoredString);

pub fn ipv6_to_type_str(ipv6_addr: &Ipv6Addr) -> &'static str {
    let first_byte = ipv6_addr.octets()[0];
    if (0x20..=0x3F).contains(&first_byte) {
        return "GUA";
    }
    if ipv6_addr.is_unique_local() {
        return "ULA";
    }
    if ipv6_addr.is_unicast_link_local() {
        return "LLA";
    }
    "IPv6"
}

pub fn ip_to_detail(ip: &IpAddr) -> Detail {
    match ip {
        IpAddr::V4(ipv4_addr) => ("IPv4".to_string(), ipv4_addr.to_string().color(colors::IPV4_ADDR)),
        IpAddr::V6(ipv6_addr) => (
            ipv6_to_type_str(ipv6_addr).to_string(),
            ipv6_addr.to_string().color(colors::IPV6_ADDR),
        ),
    }
}

pub fn mac_to_detail(mac: Option<MacAddr>) -> Option<Detail> {
    mac.map(|mac| ("MAC".to_string(), mac.to_string().color(colors::MAC_ADDR)))
}

pub fn text_detail(key: &str, value: Option<&str>) -> Option<Detail> {
    value.map(|value| (key.to_string(), value.normal()))
}

pub fn port_state(state: PortState) -> ColoredString {
    let text = state.to_string();
    match state {
        PortState::Open => text.color(colors::PORT_OPEN).bold(),
        PortState::Closed => text.color(colors::PORT_CLOSED),
        PortState::Filtered => text.color(colors::PORT_FILTERED),
    }
}

/// `80/tcp ....: open http nginx/1.24`
pub fn port_to_detail(port: &Port) -> Detail {
    let mut value = format!("{} {}", port_state(port.state), port.service.color(colors::PRIMARY));
    if let Some(version) = &port.version {
        value.push(' ');
        value.push_str(&version.dimmed().to_string());
    }
    (format!("{}/{}", port.number, port.protocol), value.normal())
}

pub fn host_details(host: &Host) -> Vec<Detail> {
    let mut details: Vec<Detail> = vec![ip_to_detail(&host.ip)];
    if host.state == HostState::Down {
        details.push(("State".to_string(), "down".red()));
    }
    details.extend(mac_to_detail(host.mac_address));
    details.extend(text_detail("Vendor", host.vendor.as_deref()));
    details.extend(text_detail("OS", host.os.as_deref()));
    details.extend(host.ports.iter().map(port_to_detail));
    details
}

pub fn host_title(host: &Host) -> String {
    match &host.hostname {
        Some(name) => format!("{name} ({})", host.ip),
        None => host.ip.to_string(),
    }
}

pub fn network_details(network: &WirelessNetwork) -> Vec<Detail> {
    let mut details: Vec<Detail> = Vec::new();
    details.extend(text_detail("BSSID", network.bssid.as_deref()));
    if let Some(channel) = network.channel {
        details.push(("Channel".to_string(), channel.to_string().normal()));
    }
    if let Some(signal) = network.signal {
        details.push(("Signal".to_string(), signal_strength(signal)));
    }
    let security = network.security.as_deref().unwrap_or("open");
    details.push(("Security".to_string(), security.normal()));
    details
}

fn signal_strength(dbm: i32) -> ColoredString {
    let text = format!("{dbm} dBm");
    match dbm {
        -60.. => text.green(),
        -75..=-61 => text.yellow(),
        _ => text.red(),
    }
}

pub fn device_details(device: &IoTDevice) -> Vec<Detail> {
    let mut details: Vec<Detail> = vec![
        ip_to_detail(&device.ip),
        ("Confidence".to_string(), confidence(device.confidence)),
    ];
    details.extend(text_detail("Vendor", device.vendor.as_deref()));
    details.extend(text_detail("OS", device.os.as_deref()));
    details.extend(device.ports.iter().map(port_to_detail));
    details.extend(text_detail("Notes", device.notes.as_deref()));
    details
}

pub fn confidence(value: f64) -> ColoredString {
    let text = format!("{:.0}%", value * 100.0);
    if value >= 0.7 {
        text.green().bold()
    } else if value >= 0.5 {
        text.yellow()
    } else {
        text.normal()
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
