use std::net::IpAddr;

use anyhow::Context;
use pnet::packet::dns::{
    DnsClass, DnsPacket, DnsQuery, DnsResponse, DnsType, DnsTypes, MutableDnsPacket, Opcode,
    Retcode,
};

pub const DNS_HDR_LEN: usize = 12;

/// Extracts the transaction id and the first PTR name of a response.
pub fn get_hostname(payload: &[u8]) -> anyhow::Result<(u16, String)> {
    let dns = DnsPacket::new(payload).context("Failed to parse DNS packet")?;
    anyhow::ensure!(dns.get_is_response() == 1, "DNS packet is not a response");
    let transaction_id = dns.get_id();
    let hostname_res = dns
        .get_responses()
        .iter()
        .find_map(|response| match response.rtype {
            DnsTypes::PTR => response_from_ptr(response),
            _ => None,
        })
        .ok_or_else(|| anyhow::anyhow!("No valid PTR record found"))?;

    Ok((transaction_id, hostname_res))
}

/// Transaction id of a DNS response; `None` for queries and garbage.
pub fn response_id(payload: &[u8]) -> Option<u16> {
    let dns = DnsPacket::new(payload)?;
    (dns.get_is_response() == 1).then(|| dns.get_id())
}

pub fn create_ptr_packet(ip_addr: &IpAddr, id: u16) -> anyhow::Result<Vec<u8>> {
    create_query_packet(&reverse_address_to_ptr(ip_addr), DnsTypes::PTR, id)
}

/// Builds a single-question recursive query.
pub fn create_query_packet(name: &str, qtype: DnsType, id: u16) -> anyhow::Result<Vec<u8>> {
    let query: DnsQuery = DnsQuery {
        qname: encode_dns_name(name),
        qtype,
        qclass: DnsClass(1),
        payload: Vec::new(),
    };
    let q_fixed_len: usize = 4;
    let qlen: usize = query.qname.len() + q_fixed_len;
    let total: usize = DNS_HDR_LEN + qlen;
    let mut buffer: Vec<u8> = vec![0u8; total];

    {
        let mut dns: MutableDnsPacket =
            MutableDnsPacket::new(&mut buffer).context("creating dns header")?;
        dns.set_id(id);
        dns.set_is_response(0);
        dns.set_opcode(Opcode::StandardQuery);
        dns.set_is_recursion_desirable(1);
        dns.set_rcode(Retcode::NoError);
        dns.set_query_count(1);
    }

    let mut cursor: usize = DNS_HDR_LEN;

    buffer[cursor..cursor + query.qname.len()].copy_from_slice(&query.qname);
    cursor += query.qname.len();

    let type_bytes: [u8; 2] = query.qtype.0.to_be_bytes();
    buffer[cursor..cursor + 2].copy_from_slice(&type_bytes);
    cursor += 2;

    let class_bytes: [u8; 2] = query.qclass.0.to_be_bytes();
    buffer[cursor..cursor + 2].copy_from_slice(&class_bytes);

    Ok(buffer)
}

/// `10.0.0.1` → `1.0.0.10.in-addr.arpa`, IPv6 as reversed nibbles under `ip6.arpa`.
pub fn reverse_address_to_ptr(ip_addr: &IpAddr) -> String {
    match ip_addr {
        IpAddr::V4(v4) => {
            let [a, b, c, d] = v4.octets();
            format!("{d}.{c}.{b}.{a}.in-addr.arpa")
        }
        IpAddr::V6(v6) => {
            let mut labels: Vec<String> = Vec::with_capacity(33);
            for byte in v6.octets().iter().rev() {
                labels.push(format!("{:x}", byte & 0x0f));
                labels.push(format!("{:x}", byte >> 4));
            }
            labels.push("ip6.arpa".to_string());
            labels.join(".")
        }
    }
}

fn response_from_ptr(response: &DnsResponse) -> Option<String> {
    decode_dns_name(&response.data).filter(|name| !name.is_empty())
}

fn encode_dns_name(name: &str) -> Vec<u8> {
    let mut encoded: Vec<u8> = Vec::new();
    for label in name.split('.') {
        if label.is_empty() {
            continue;
        }
        encoded.push(label.len() as u8);
        encoded.extend_from_slice(label.as_bytes());
    }
    encoded.push(0);
    encoded
}

// Compression pointers are not followed; PTR answers from common resolvers are
// written uncompressed.
fn decode_dns_name(data: &[u8]) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    let mut cursor: usize = 0;
    while cursor < data.len() {
        let len: usize = data[cursor] as usize;
        if len == 0 {
            break;
        }
        if len & 0xc0 != 0 {
            return None;
        }
        cursor += 1;
        if cursor + len > data.len() {
            return None;
        }
        let label: &str = std::str::from_utf8(&data[cursor..cursor + len]).ok()?;
        parts.push(label);
        cursor += len;
    }
    Some(parts.join("."))
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
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn reverse_names() {
        let v4 = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20));
        assert_eq!(reverse_address_to_ptr(&v4), "20.1.168.192.in-addr.arpa");

        let v6 = IpAddr::V6(Ipv6Addr::LOCALHOST);
        let ptr = reverse_address_to_ptr(&v6);
        assert!(ptr.starts_with("1.0.0.0."));
        assert!(ptr.ends_with(".ip6.arpa"));
        assert_eq!(ptr.split('.').count(), 34);
    }

    #[test]
    fn ptr_query_layout() {
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let packet = create_ptr_packet(&ip, 0xbeef).unwrap();
        let dns = DnsPacket::new(&packet).unwrap();

        assert_eq!(dns.get_id(), 0xbeef);
        assert_eq!(dns.get_query_count(), 1);
        assert_eq!(dns.get_queries()[0].qtype, DnsTypes::PTR);
        assert_eq!(
            decode_dns_name(&dns.get_queries()[0].qname).as_deref(),
            Some("1.0.0.10.in-addr.arpa")
        );
    }

    #[test]
    fn queries_are_not_mistaken_for_answers() {
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let packet = create_ptr_packet(&ip, 1).unwrap();
        assert!(get_hostname(&packet).is_err());
    }
}
