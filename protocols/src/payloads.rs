//! Requests that make a silent service talk.

use pnet::packet::dns::DnsTypes;

use crate::dns;

const HTTP_GET: &[u8] = b"GET / HTTP/1.0\r\nUser-Agent: netsurvey\r\nAccept: */*\r\n\r\n";
const RTSP_OPTIONS: &[u8] = b"OPTIONS * RTSP/1.0\r\nCSeq: 1\r\n\r\n";
const REDIS_PING: &[u8] = b"PING\r\n";
const GENERIC: &[u8] = b"\r\n\r\n";

/// MQTT 3.1.1 CONNECT, clean session, keep-alive 60s, client id `netsurvey`.
const MQTT_CONNECT: &[u8] = &[
    0x10, 0x15, 0x00, 0x04, b'M', b'Q', b'T', b'T', 0x04, 0x02, 0x00, 0x3c, 0x00, 0x09, b'n', b'e',
    b't', b's', b'u', b'r', b'v', b'e', b'y',
];

const NTP_CLIENT: [u8; 48] = {
    let mut request = [0u8; 48];
    request[0] = 0x1b;
    request
};

/// SNMPv1 GetRequest for sysDescr.0 with community `public`.
const SNMP_GET_SYSDESCR: &[u8] = &[
    0x30, 0x29, 0x02, 0x01, 0x00, 0x04, 0x06, b'p', b'u', b'b', b'l', b'i', b'c', 0xa0, 0x1c, 0x02,
    0x04, 0x00, 0x00, 0x00, 0x01, 0x02, 0x01, 0x00, 0x02, 0x01, 0x00, 0x30, 0x0e, 0x30, 0x0c, 0x06,
    0x08, 0x2b, 0x06, 0x01, 0x02, 0x01, 0x01, 0x01, 0x00, 0x05, 0x00,
];

const SSDP_SEARCH: &[u8] = b"M-SEARCH * HTTP/1.1\r\nHOST: 239.255.255.250:1900\r\n\
MAN: \"ssdp:discover\"\r\nMX: 1\r\nST: ssdp:all\r\n\r\n";

/// Confirmable CoAP GET /.well-known/core.
const COAP_DISCOVERY: &[u8] = &[
    0x40, 0x01, 0x12, 0x34, 0xbb, b'.', b'w', b'e', b'l', b'l', b'-', b'k', b'n', b'o', b'w', b'n',
    0x04, b'c', b'o', b'r', b'e',
];

/// What to send on a TCP connection that stayed silent after connecting.
pub fn tcp_request(port: u16) -> &'static [u8] {
    match port {
        80 | 81 | 5000 | 8000 | 8008 | 8080 | 8081 | 8888 | 9000 | 49152 => HTTP_GET,
        554 | 8554 => RTSP_OPTIONS,
        6379 => REDIS_PING,
        1883 => MQTT_CONNECT,
        _ => GENERIC,
    }
}

/// Datagram that solicits an answer from a UDP service.
pub fn udp_payload(port: u16) -> Vec<u8> {
    match port {
        53 => dns::create_query_packet(".", DnsTypes::NS, rand::random()).unwrap_or_default(),
        123 => NTP_CLIENT.to_vec(),
        161 => SNMP_GET_SYSDESCR.to_vec(),
        1900 => SSDP_SEARCH.to_vec(),
        5353 => dns::create_query_packet("_services._dns-sd._udp.local", DnsTypes::PTR, 0)
            .unwrap_or_default(),
        5683 => COAP_DISCOVERY.to_vec(),
        _ => Vec::new(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use pnet::packet::dns::DnsPacket;

    #[test]
    fn mqtt_remaining_length_matches() {
        assert_eq!(MQTT_CONNECT[1] as usize, MQTT_CONNECT.len() - 2);
    }

    #[test]
    fn snmp_lengths_match() {
        assert_eq!(SNMP_GET_SYSDESCR[1] as usize, SNMP_GET_SYSDESCR.len() - 2);
        assert_eq!(SNMP_GET_SYSDESCR[14] as usize, SNMP_GET_SYSDESCR.len() - 15);
    }

    #[test]
    fn dns_payloads_parse() {
        let query = udp_payload(53);
        let packet = DnsPacket::new(&query).unwrap();
        assert_eq!(packet.get_queries()[0].qtype, DnsTypes::NS);

        let mdns = udp_payload(5353);
        assert!(DnsPacket::new(&mdns).is_some());
    }

    #[test]
    fn silent_services_get_a_request() {
        assert!(tcp_request(8080).starts_with(b"GET / "));
        assert!(tcp_request(554).starts_with(b"OPTIONS"));
        assert_eq!(tcp_request(31337), GENERIC);
        assert!(udp_payload(40000).is_empty());
    }
}
