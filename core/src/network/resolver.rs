use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use netsurvey_protocols::dns;
use tokio::net::UdpSocket;
use tokio::time;

const RESOLV_CONF: &str = "/etc/resolv.conf";
const DNS_PORT: u16 = 53;
const MAX_DNS_LEN: usize = 512;

/// First nameserver configured for this host.
pub fn system_nameserver() -> Option<SocketAddr> {
    let conf = std::fs::read_to_string(RESOLV_CONF).ok()?;
    parse_nameserver(&conf)
}

pub fn parse_nameserver(conf: &str) -> Option<SocketAddr> {
    conf.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#') && !line.starts_with(';'))
        .filter_map(|line| line.strip_prefix("nameserver"))
        .find_map(|rest| {
            let addr = rest.trim().split('%').next()?;
            addr.parse::<IpAddr>().ok()
        })
        .map(|ip| SocketAddr::new(ip, DNS_PORT))
}

/// Asks `nameserver` for the PTR record of `ip`.
///
/// `Ok(None)` when the server answers without a name, or nothing matching
/// our transaction arrives within `budget`.
pub async fn reverse_lookup(nameserver: SocketAddr, ip: IpAddr, budget: Duration) -> anyhow::Result<Option<String>> {
    let bind: SocketAddr = match nameserver {
        SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
        SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
    };
    let socket = UdpSocket::bind(bind).await?;
    socket.connect(nameserver).await?;

    let id: u16 = rand::random();
    let query = dns::create_ptr_packet(&ip, id)?;
    socket.send(&query).await?;

    let mut buffer = [0u8; MAX_DNS_LEN];
    let answer = time::timeout(budget, async {
        loop {
            let n = socket.recv(&mut buffer).await?;
            let payload = &buffer[..n];
            if dns::response_id(payload) == Some(id) {
                let name = dns::get_hostname(payload).ok().map(|(_, name)| name);
                return anyhow::Ok(name);
            }
        }
    })
    .await;

    match answer {
        Ok(result) => result,
        Err(_elapsed) => Ok(None),
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

    #[test]
    fn first_nameserver_wins() {
        let conf = "\
# generated by NetworkManager
search lan
nameserver 192.168.1.1
nameserver 8.8.8.8
";
        assert_eq!(parse_nameserver(conf), Some("192.168.1.1:53".parse().unwrap()));
    }

    #[test]
    fn scoped_ipv6_nameserver() {
        let conf = "nameserver fe80::1%wlan0\n";
        let expected = SocketAddr::new("fe80::1".parse().unwrap(), DNS_PORT);
        assert_eq!(parse_nameserver(conf), Some(expected));
        assert_eq!(parse_nameserver("search lan\n"), None);
    }

    #[tokio::test]
    async fn unanswered_lookup_yields_no_name() {
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let nameserver = silent.local_addr().unwrap();
        let ip: IpAddr = "192.168.1.20".parse().unwrap();

        let name = reverse_lookup(nameserver, ip, Duration::from_millis(100)).await.unwrap();
        assert_eq!(name, None);
    }
}
