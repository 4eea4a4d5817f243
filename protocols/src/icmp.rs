use anyhow::Context;
use pnet::packet::Packet;
use pnet::packet::icmp::echo_request::MutableEchoRequestPacket;
use pnet::packet::icmp::{self, IcmpCode, IcmpPacket, IcmpTypes};

pub const ICMP_ECHO_HDR_LEN: usize = 8;
const ECHO_PAYLOAD: &[u8] = b"netsurvey";

/// Builds an ICMPv4 echo request with a valid checksum.
pub fn create_echo_request(identifier: u16, sequence: u16) -> anyhow::Result<Vec<u8>> {
    let mut buffer: Vec<u8> = vec![0u8; ICMP_ECHO_HDR_LEN + ECHO_PAYLOAD.len()];
    {
        let mut echo = MutableEchoRequestPacket::new(&mut buffer).context("creating echo request")?;
        echo.set_icmp_type(IcmpTypes::EchoRequest);
        echo.set_icmp_code(IcmpCode(0));
        echo.set_identifier(identifier);
        echo.set_sequence_number(sequence);
        echo.set_payload(ECHO_PAYLOAD);
    }
    let checksum = {
        let packet = IcmpPacket::new(&buffer).context("reading echo request")?;
        icmp::checksum(&packet)
    };
    buffer[2..4].copy_from_slice(&checksum.to_be_bytes());
    Ok(buffer)
}

/// Identifier of an echo reply; `None` for every other ICMP message.
pub fn reply_identifier(packet: &IcmpPacket) -> Option<u16> {
    if packet.get_icmp_type() != IcmpTypes::EchoReply {
        return None;
    }
    match packet.packet() {
        [_, _, _, _, hi, lo, ..] => Some(u16::from_be_bytes([*hi, *lo])),
        _ => None,
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
