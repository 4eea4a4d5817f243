use std::sync::Arc;
use std::time::Duration;

use netsurvey_common::error::ScanError;
use netsurvey_common::network::host::{HostState, Port, PortState, Protocol};
use netsurvey_common::probe::ProbeKind;
use netsurvey_common::scanning::{NetworkScanner, ScanType};
use pnet::util::MacAddr;
use tokio::time::Instant;

use crate::fixture::{engine, test_config, FixtureExecutor, FixtureHost};

fn small_office() -> FixtureExecutor {
    FixtureExecutor::new()
        .host(
            "10.0.0.1",
            FixtureHost::new()
                .tcp(22, Some(b"SSH-2.0-OpenSSH_9.6p1 Ubuntu-3ubuntu13\r\n"))
                .tcp(80, Some(b"HTTP/1.1 200 OK\r\nServer: nginx/1.24.0\r\n\r\n"))
                .udp(53, b"\x12\x34\x81\x80")
                .stack(64, 29200)
                .hostname("gateway.lan"),
        )
        .host(
            "10.0.0.2",
            FixtureHost::new()
                .tcp(445, None)
                .tcp(3389, None)
                .stack(128, 8192)
                .mac(MacAddr::new(0x00, 0x15, 0x5d, 0x01, 0x02, 0x03)),
        )
}

fn assert_ports_strictly_ascending(ports: &[Port]) {
    for protocol in [Protocol::Tcp, Protocol::Udp] {
        let numbers: Vec<u16> = ports
            .iter()
            .filter(|p| p.protocol == protocol)
            .map(|p| p.number)
            .collect();
        assert!(numbers.windows(2).all(|w| w[0] < w[1]), "{numbers:?}");
        assert!(numbers.iter().all(|n| *n >= 1));
    }
}

#[tokio::test(start_paused = true)]
async fn topology_counts_every_address_of_the_range() {
    let fixture = Arc::new(small_office());
    let scanner = engine(&fixture, test_config());

    let topology = scanner.scan_network("10.0.0.0/30", "quick").await.unwrap();

    assert_eq!(topology.total_hosts, 4);
    assert_eq!(topology.active_hosts, 2);
    assert!(topology.active_hosts <= topology.total_hosts);
    assert_eq!(
        topology.active_hosts,
        topology.hosts.iter().filter(|h| h.state == HostState::Up).count()
    );
    assert_eq!(topology.network_range, "10.0.0.0/30");
    assert!(!topology.scan_id.is_empty());
}

#[tokio::test(start_paused = true)]
async fn duration_matches_timestamps() {
    let fixture = Arc::new(small_office().with_delay(Duration::from_millis(20)));
    let scanner = engine(&fixture, test_config());

    let topology = scanner.scan_network("10.0.0.0/30", "quick").await.unwrap();

    let elapsed = (topology.scan_end - topology.scan_start).num_microseconds().unwrap() as f64 / 1e6;
    assert!((elapsed - topology.duration).abs() < 1e-6);
    assert!(topology.scan_end >= topology.scan_start);
}

#[tokio::test(start_paused = true)]
async fn full_scan_identifies_services_and_os() {
    let fixture = Arc::new(small_office());
    let scanner = engine(&fixture, test_config());

    let topology = scanner.scan_network("10.0.0.0/30", "FULL").await.unwrap();

    let gateway = &topology.hosts[0];
    assert_eq!(gateway.ip.to_string(), "10.0.0.1");
    assert_eq!(gateway.hostname.as_deref(), Some("gateway.lan"));
    assert_eq!(gateway.os.as_deref(), Some("Linux"));

    let ssh = gateway.ports.iter().find(|p| p.number == 22).unwrap();
    assert_eq!(ssh.service, "ssh");
    assert!(ssh.version.as_deref().unwrap_or_default().contains("OpenSSH"));

    let http = gateway.ports.iter().find(|p| p.number == 80).unwrap();
    assert_eq!(http.service, "http");
    assert_eq!(http.version.as_deref(), Some("nginx/1.24.0"));

    let dns = gateway
        .ports
        .iter()
        .find(|p| p.number == 53 && p.protocol == Protocol::Udp)
        .unwrap();
    assert_eq!(dns.state, PortState::Open);

    let windows = &topology.hosts[1];
    assert_eq!(windows.os.as_deref(), Some("Windows"));
    assert!(windows.mac_address.is_some());

    for host in &topology.hosts {
        assert_ports_strictly_ascending(&host.ports);
    }
}

#[tokio::test(start_paused = true)]
async fn scan_host_reports_open_ports_with_services() {
    let fixture = Arc::new(
        FixtureExecutor::new().host("127.0.0.1", FixtureHost::new().tcp(22, None).tcp(80, None)),
    );
    let scanner = engine(&fixture, test_config());

    let host = scanner.scan_host("127.0.0.1").await.unwrap();

    assert_eq!(host.state, HostState::Up);
    assert_eq!(
        host.ports,
        vec![
            Port::tcp(22, PortState::Open, "ssh"),
            Port::tcp(80, PortState::Open, "http"),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn scan_host_finds_hosts_that_ignore_liveness() {
    let fixture = Arc::new(
        FixtureExecutor::new().host("10.9.9.9", FixtureHost::new().tcp(443, None).ignoring_liveness()),
    );
    let scanner = engine(&fixture, test_config());

    let host = scanner.scan_host("10.9.9.9").await.unwrap();

    assert_eq!(host.state, HostState::Up);
    assert_eq!(host.ports[0].number, 443);
}

#[tokio::test(start_paused = true)]
async fn silent_host_is_reported_down() {
    let fixture = Arc::new(FixtureExecutor::new());
    let scanner = engine(&fixture, test_config());

    let host = scanner.scan_host("10.9.9.9").await.unwrap();

    assert_eq!(host.state, HostState::Down);
    assert!(host.ports.is_empty());
}

#[tokio::test(start_paused = true)]
async fn quick_issues_fewer_port_probes_than_full() {
    let quick_fixture = Arc::new(small_office());
    engine(&quick_fixture, test_config())
        .scan_network("10.0.0.0/30", "quick")
        .await
        .unwrap();

    let full_fixture = Arc::new(small_office());
    engine(&full_fixture, test_config())
        .scan_network("10.0.0.0/30", "full")
        .await
        .unwrap();

    assert!(quick_fixture.port_probes() < full_fixture.port_probes());
    assert_eq!(quick_fixture.count(ProbeKind::Banner), 0);
    assert!(full_fixture.count(ProbeKind::Banner) > 0);
}

#[tokio::test(start_paused = true)]
async fn in_flight_probes_never_exceed_the_limit() {
    let mut fixture = FixtureExecutor::new().with_delay(Duration::from_millis(10));
    for last in 1..=14 {
        fixture = fixture.host(&format!("10.1.0.{last}"), FixtureHost::new().tcp(80, None));
    }
    let fixture = Arc::new(fixture);
    let mut config = test_config();
    config.max_in_flight_probes = 4;
    let scanner = engine(&fixture, config);

    let topology = scanner.scan_network("10.1.0.0/28", "quick").await.unwrap();

    assert_eq!(topology.active_hosts, 14);
    assert!(fixture.max_in_flight() <= 4, "saw {}", fixture.max_in_flight());
    assert!(fixture.max_in_flight() > 1);
    assert_eq!(scanner.pool().in_flight(), 0);
}

#[tokio::test(start_paused = true)]
async fn short_deadline_returns_partial_topology_in_time() {
    let fixture = Arc::new(
        FixtureExecutor::new()
            .host("10.2.0.1", FixtureHost::new().tcp(22, None))
            .with_delay(Duration::from_millis(150)),
    );
    let scanner = engine(&fixture, test_config());
    let budget = Duration::from_millis(400);

    let started = Instant::now();
    let topology = scanner
        .scan_network_with_deadline("10.2.0.0/24", "full", budget)
        .await
        .unwrap();

    assert!(started.elapsed() <= budget + Duration::from_millis(50));
    assert_eq!(topology.total_hosts, 256);
    assert!(topology.active_hosts <= 1);
}

#[tokio::test(start_paused = true)]
async fn unresponsive_range_respects_the_deadline() {
    let fixture = Arc::new(FixtureExecutor::new());
    let scanner = engine(&fixture, test_config());
    let budget = Duration::from_millis(300);

    let started = Instant::now();
    let topology = scanner
        .scan_network_with_deadline("10.3.0.0/24", "quick", budget)
        .await
        .unwrap();

    assert!(started.elapsed() <= budget + Duration::from_millis(50));
    assert_eq!(topology.active_hosts, 0);
    assert!(topology.hosts.is_empty());
}

#[tokio::test(start_paused = true)]
async fn unknown_scan_type_is_rejected_without_probing() {
    let fixture = Arc::new(small_office());
    let scanner = engine(&fixture, test_config());

    let result = scanner.scan_network("10.0.0.0/30", "stealth").await;

    assert_eq!(result.unwrap_err(), ScanError::InvalidScanType("stealth".into()));
    assert_eq!(fixture.total_probes(), 0);
}

#[tokio::test(start_paused = true)]
async fn executor_fault_aborts_the_scan() {
    let fixture = Arc::new(small_office().fault_on(ProbeKind::TcpConnect));
    let scanner = engine(&fixture, test_config());

    let result = scanner.scan_network("10.0.0.0/30", "quick").await;

    assert!(matches!(result, Err(ScanError::ExecutorFault(_))));
}

#[tokio::test(start_paused = true)]
async fn syn_technique_falls_back_without_raw_sockets() {
    let fixture = Arc::new(small_office().unprivileged());
    let mut config = test_config();
    config.tcp_technique = netsurvey_common::config::TcpTechnique::Syn;
    let scanner = engine(&fixture, config);

    let host = scanner.scan_host_with("10.0.0.1", ScanType::Quick).await.unwrap();

    assert_eq!(fixture.count(ProbeKind::TcpSyn), 0);
    assert_eq!(fixture.count(ProbeKind::OsFingerprint), 0);
    assert!(fixture.count(ProbeKind::TcpConnect) > 0);
    assert!(host.ports.iter().any(|p| p.number == 22));
}

#[tokio::test(start_paused = true)]
async fn scans_run_on_spawned_tasks() {
    let fixture = Arc::new(small_office());
    let scanner = Arc::new(engine(&fixture, test_config()));

    let network = tokio::spawn({
        let scanner = Arc::clone(&scanner);
        async move { scanner.scan_network("10.0.0.0/30", "full").await }
    });
    let host = tokio::spawn({
        let scanner = Arc::clone(&scanner);
        async move { scanner.scan_host("10.0.0.1").await }
    });
    let discovered = tokio::spawn({
        let scanner = Arc::clone(&scanner);
        async move { scanner.discover_hosts("10.0.0.0/30").await }
    });
    let survey = tokio::spawn({
        let scanner = Arc::clone(&scanner);
        async move { scanner.scan_wireless_iot(Some("10.0.0.0/30")).await }
    });

    assert_eq!(network.await.unwrap().unwrap().active_hosts, 2);
    assert!(host.await.unwrap().unwrap().is_up());
    assert_eq!(discovered.await.unwrap().unwrap(), vec!["10.0.0.1", "10.0.0.2"]);
    assert!(survey.await.unwrap().is_ok());
}
