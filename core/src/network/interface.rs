use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use pnet::datalink::{self, NetworkInterface};
use pnet::ipnetwork::{IpNetwork, Ipv4Network};
use pnet::util::MacAddr;

#[cfg(target_os = "linux")]
use linux_impl::{is_physical, is_wireless};
#[cfg(target_os = "macos")]
use macos_impl::{is_physical, is_wireless};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ViabilityError {
    /// The interface is operationally down.
    IsDown,
    /// Loopback or virtual.
    NotPhysical,
    NoMacAddress,
    /// No broadcast means no ARP.
    NotBroadcast,
    /// VPN and other point-to-point links.
    IsPointToPoint,
    /// Neither a private IPv4 address nor an IPv6 link-local one.
    NoValidLanIp,
}

/// The private IPv4 network of the preferred LAN interface, used as the
/// survey scope when none is requested.
pub fn lan_network() -> anyhow::Result<Option<Ipv4Network>> {
    let interfaces: Vec<NetworkInterface> = datalink::interfaces()
        .into_iter()
        .filter(|interface| is_viable_lan_interface(interface, is_physical).is_ok())
        .collect();

    let Some(interface) = select_best_lan_interface(interfaces, is_wired) else {
        anyhow::bail!("no interfaces available for LAN discovery");
    };

    Ok(interface.ips.iter().find_map(|net| match net {
        IpNetwork::V4(v4) if v4.ip().is_private() => Some(*v4),
        _ => None,
    }))
}

/// Names of the interfaces backed by wireless hardware.
pub fn wireless_interfaces() -> Vec<String> {
    datalink::interfaces()
        .into_iter()
        .filter(|interface| interface.is_up() && is_wireless(interface))
        .map(|interface| interface.name)
        .collect()
}

/// Hardware address of the local interface owning `ip`, if any.
pub fn local_mac(ip: IpAddr) -> Option<MacAddr> {
    datalink::interfaces()
        .into_iter()
        .filter(|interface| !interface.is_loopback())
        .find(|interface| interface.ips.iter().any(|net| net.ip() == ip))
        .and_then(|interface| interface.mac)
        .filter(|mac| *mac != MacAddr::zero())
}

/// Source address the kernel would pick to reach `target`.
pub fn route_source_v4(target: Ipv4Addr) -> Option<Ipv4Addr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect((target, 53)).ok()?;
    match socket.local_addr().ok()?.ip() {
        IpAddr::V4(source) if !source.is_unspecified() => Some(source),
        _ => None,
    }
}

fn is_viable_lan_interface(
    interface: &NetworkInterface,
    is_physical: impl Fn(&NetworkInterface) -> bool,
) -> Result<(), ViabilityError> {
    if !interface.is_up() {
        return Err(ViabilityError::IsDown);
    }
    if interface.is_loopback() || !is_physical(interface) {
        return Err(ViabilityError::NotPhysical);
    }
    if interface.mac.is_none() {
        return Err(ViabilityError::NoMacAddress);
    }
    if !interface.is_broadcast() {
        return Err(ViabilityError::NotBroadcast);
    }
    if interface.is_point_to_point() {
        return Err(ViabilityError::IsPointToPoint);
    }
    let has_valid_ip = interface.ips.iter().any(|net| match net {
        IpNetwork::V4(ipv4) => ipv4.ip().is_private(),
        IpNetwork::V6(ipv6) => ipv6.ip().is_unicast_link_local(),
    });
    if !has_valid_ip {
        return Err(ViabilityError::NoValidLanIp);
    }
    Ok(())
}

fn select_best_lan_interface(
    interfaces: Vec<NetworkInterface>,
    is_wired: impl Fn(&NetworkInterface) -> bool,
) -> Option<NetworkInterface> {
    let wired = interfaces.iter().position(|interface| is_wired(interface));
    let index = wired.unwrap_or(0);
    interfaces.into_iter().nth(index)
}

fn is_wired(interface: &NetworkInterface) -> bool {
    is_physical(interface) && !is_wireless(interface)
}

#[cfg(target_os = "linux")]
mod linux_impl {
    use super::*;
    use std::path::Path;

    pub fn is_physical(interface: &NetworkInterface) -> bool {
        Path::new(&format!("/sys/class/net/{}/device", interface.name)).exists()
    }

    pub fn is_wireless(interface: &NetworkInterface) -> bool {
        Path::new(&format!("/sys/class/net/{}/wireless", interface.name)).exists()
    }
}

#[cfg(target_os = "macos")]
mod macos_impl {
    use super::*;
    use std::collections::HashSet;
    use std::process::Command;
    use std::sync::OnceLock;

    struct HardwareInfo {
        physical_devices: HashSet<String>,
        wireless_devices: HashSet<String>,
    }

    /// Asks `networksetup` once per process.
    fn hardware_info() -> &'static HardwareInfo {
        static HARDWARE_INFO: OnceLock<HardwareInfo> = OnceLock::new();

        HARDWARE_INFO.get_or_init(|| {
            let mut physical = HashSet::new();
            if let Ok(output) = Command::new("networksetup").arg("-listallhardwareports").output() {
                let stdout = String::from_utf8_lossy(&output.stdout);
                physical.extend(
                    stdout
                        .lines()
                        .filter_map(|line| line.strip_prefix("Device: "))
                        .map(|device| device.trim().to_string()),
                );
            }

            let wireless = physical
                .iter()
                .filter(|device| {
                    Command::new("networksetup")
                        .arg("-getairportnetwork")
                        .arg(device.as_str())
                        .output()
                        .map(|out| out.status.success())
                        .unwrap_or(false)
                })
                .cloned()
                .collect();

            HardwareInfo {
                physical_devices: physical,
                wireless_devices: wireless,
            }
        })
    }

    pub fn is_physical(interface: &NetworkInterface) -> bool {
        hardware_info().physical_devices.contains(&interface.name)
    }

    pub fn is_wireless(interface: &NetworkInterface) -> bool {
        hardware_info().wireless_devices.contains(&interface.name)
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn is_physical(_interface: &NetworkInterface) -> bool {
    true
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn is_wireless(_interface: &NetworkInterface) -> bool {
    false
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
