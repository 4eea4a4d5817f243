use std::net::Ipv4Addr;

use anyhow::Context;
use pnet::packet::tcp::{self, MutableTcpPacket, TcpFlags, TcpOption, TcpPacket};

/// 20 byte header plus the 4 byte MSS option.
pub const TCP_SYN_LEN: usize = 24;
const MSS: u16 = 1460;
const WINDOW: u16 = 64240;

/// What a target answered to a SYN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynReply {
    /// SYN-ACK: something listens.
    Open { window: u16 },
    /// RST: reachable, nothing listens.
    Closed { window: u16 },
}

impl SynReply {
    pub fn window(&self) -> u16 {
        match self {
            SynReply::Open { window } | SynReply::Closed { window } => *window,
        }
    }
}

/// Builds a SYN segment with a checksum valid for `src` → `dst`.
pub fn create_syn_packet(
    src: Ipv4Addr,
    dst: Ipv4Addr,
    src_port: u16,
    dst_port: u16,
    sequence: u32,
) -> anyhow::Result<Vec<u8>> {
    let mut buffer: Vec<u8> = vec![0u8; TCP_SYN_LEN];
    {
        let mut syn = MutableTcpPacket::new(&mut buffer).context("creating tcp packet")?;
        syn.set_source(src_port);
        syn.set_destination(dst_port);
        syn.set_sequence(sequence);
        syn.set_acknowledgement(0);
        syn.set_data_offset((TCP_SYN_LEN / 4) as u8);
        syn.set_flags(TcpFlags::SYN);
        syn.set_window(WINDOW);
        syn.set_urgent_ptr(0);
        syn.set_options(&[TcpOption::mss(MSS)]);
        let checksum = tcp::ipv4_checksum(&syn.to_immutable(), &src, &dst);
        syn.set_checksum(checksum);
    }
    Ok(buffer)
}

/// Interprets a segment sent back to `(src_port, sequence)` of an outstanding SYN.
///
/// Returns `None` for segments belonging to something else.
pub fn classify_reply(packet: &TcpPacket, src_port: u16, sequence: u32) -> Option<SynReply> {
    if packet.get_destination() != src_port {
        return None;
    }
    let flags = packet.get_flags();
    let acks_our_syn = packet.get_acknowledgement() == sequence.wrapping_add(1);
    let window = packet.get_window();

    if flags & TcpFlags::SYN != 0 && flags & TcpFlags::ACK != 0 && acks_our_syn {
        Some(SynReply::Open { window })
    } else if flags & TcpFlags::RST != 0 {
        Some(SynReply::Closed { window })
    } else {
        None
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
