//! # Host Model
//!
//! Value types produced by a scan. They are built once by the engine and handed
//! to the caller as immutable snapshots.

use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use pnet::util::MacAddr;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "tcp"),
            Protocol::Udp => write!(f, "udp"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortState {
    Open,
    Closed,
    Filtered,
}

impl fmt::Display for PortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortState::Open => write!(f, "open"),
            PortState::Closed => write!(f, "closed"),
            PortState::Filtered => write!(f, "filtered"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostState {
    Up,
    Down,
}

/// A single scanned port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub number: u16,
    pub protocol: Protocol,
    pub state: PortState,
    pub service: String,
    pub version: Option<String>,
}

impl Port {
    pub fn new(number: u16, protocol: Protocol, state: PortState, service: impl Into<String>) -> Self {
        Self {
            number,
            protocol,
            state,
            service: service.into(),
            version: None,
        }
    }

    pub fn tcp(number: u16, state: PortState, service: impl Into<String>) -> Self {
        Self::new(number, Protocol::Tcp, state, service)
    }

    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    /// Sort key used for every port list: number first, then tcp before udp.
    pub fn sort_key(&self) -> (u16, Protocol) {
        (self.number, self.protocol)
    }
}

/// A host as reported by a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Host {
    pub ip: IpAddr,
    pub hostname: Option<String>,
    pub state: HostState,
    pub mac_address: Option<MacAddr>,
    pub vendor: Option<String>,
    pub os: Option<String>,
    pub ports: Vec<Port>,
    pub scan_time: DateTime<Utc>,
}

impl Host {
    pub fn up(ip: IpAddr) -> Self {
        Self {
            ip,
            hostname: None,
            state: HostState::Up,
            mac_address: None,
            vendor: None,
            os: None,
            ports: Vec::new(),
            scan_time: Utc::now(),
        }
    }

    /// A host that never answered. Down hosts carry no ports.
    pub fn down(ip: IpAddr) -> Self {
        Self {
            state: HostState::Down,
            ..Self::up(ip)
        }
    }

    pub fn with_mac(mut self, mac: Option<MacAddr>) -> Self {
        self.mac_address = mac;
        self
    }

    pub fn with_hostname(mut self, hostname: Option<String>) -> Self {
        self.hostname = hostname;
        self
    }

    pub fn with_fingerprint(mut self, os: Option<String>, vendor: Option<String>) -> Self {
        self.os = os;
        self.vendor = vendor;
        self
    }

    /// Attaches the port list, sorted and deduplicated. Ignored for down hosts.
    pub fn with_ports(mut self, mut ports: Vec<Port>) -> Self {
        if self.state == HostState::Down {
            return self;
        }
        ports.sort_by_key(Port::sort_key);
        ports.dedup_by_key(|port| port.sort_key());
        self.ports = ports;
        self
    }

    pub fn is_up(&self) -> bool {
        self.state == HostState::Up
    }

    pub fn open_ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter().filter(|port| port.state == PortState::Open)
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
