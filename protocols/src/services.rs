//! Well-known port names.

use netsurvey_common::network::host::Protocol;

/// TCP ports probed by a quick scan, most commonly open first.
pub const TOP_TCP_PORTS: [u16; 20] = [
    80, 23, 443, 21, 22, 25, 3389, 110, 445, 139, 143, 53, 135, 3306, 8080, 1723, 111, 995, 993,
    5900,
];

/// The registered (or de facto) service name of `port`.
pub fn service_name(port: u16, protocol: Protocol) -> Option<&'static str> {
    match protocol {
        Protocol::Tcp => tcp_service(port),
        Protocol::Udp => udp_service(port),
    }
}

/// Like [`service_name`], falling back to `"unknown"`.
pub fn service_or_unknown(port: u16, protocol: Protocol) -> &'static str {
    service_name(port, protocol).unwrap_or("unknown")
}

fn tcp_service(port: u16) -> Option<&'static str> {
    let name = match port {
        7 => "echo",
        20 => "ftp-data",
        21 => "ftp",
        22 => "ssh",
        23 => "telnet",
        25 => "smtp",
        53 => "domain",
        80 => "http",
        88 => "kerberos",
        110 => "pop3",
        111 => "rpcbind",
        119 => "nntp",
        135 => "msrpc",
        139 => "netbios-ssn",
        143 => "imap",
        389 => "ldap",
        443 => "https",
        445 => "microsoft-ds",
        465 => "smtps",
        515 => "printer",
        548 => "afp",
        554 => "rtsp",
        587 => "submission",
        631 => "ipp",
        636 => "ldaps",
        873 => "rsync",
        993 => "imaps",
        995 => "pop3s",
        1433 => "ms-sql-s",
        1723 => "pptp",
        1883 => "mqtt",
        2020 => "onvif",
        3306 => "mysql",
        3389 => "ms-wbt-server",
        5000 => "upnp",
        5432 => "postgresql",
        5555 => "adb",
        5900 => "vnc",
        6379 => "redis",
        6668 => "tuya",
        8000 => "http-alt",
        8008 => "http",
        8009 => "ajp13",
        8080 => "http-proxy",
        8081 => "blackice-icecap",
        8443 => "https-alt",
        8554 => "rtsp-alt",
        8883 => "secure-mqtt",
        8888 => "sun-answerbook",
        9000 => "cslistener",
        9100 => "jetdirect",
        9999 => "abyss",
        27017 => "mongodb",
        49152 => "upnp",
        _ => return None,
    };
    Some(name)
}

fn udp_service(port: u16) -> Option<&'static str> {
    let name = match port {
        53 => "domain",
        67 => "dhcps",
        68 => "dhcpc",
        69 => "tftp",
        123 => "ntp",
        137 => "netbios-ns",
        138 => "netbios-dgm",
        161 => "snmp",
        162 => "snmptrap",
        500 => "isakmp",
        514 => "syslog",
        1900 => "upnp",
        4500 => "nat-t-ike",
        5353 => "mdns",
        5683 => "coap",
        _ => return None,
    };
    Some(name)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
