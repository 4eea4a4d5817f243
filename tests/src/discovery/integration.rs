use std::sync::Arc;
use std::time::Duration;

use netsurvey_common::error::ScanError;
use netsurvey_common::probe::ProbeKind;
use netsurvey_common::scanning::NetworkScanner;

use crate::fixture::{engine, test_config, FixtureExecutor, FixtureHost};

#[tokio::test(start_paused = true)]
async fn only_responsive_addresses_are_discovered() {
    let fixture = Arc::new(FixtureExecutor::new().host("10.0.0.1", FixtureHost::new()));
    let scanner = engine(&fixture, test_config());

    let hosts = scanner.discover_hosts("10.0.0.0/30").await.unwrap();

    assert_eq!(hosts, vec!["10.0.0.1".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn silent_addresses_are_retried_once() {
    let fixture = Arc::new(FixtureExecutor::new().host("10.0.0.1", FixtureHost::new()));
    let scanner = engine(&fixture, test_config());

    scanner.discover_hosts("10.0.0.0/30").await.unwrap();

    // one answer, three silent addresses probed twice
    assert_eq!(fixture.count(ProbeKind::Liveness), 1 + 3 * 2);
}

#[tokio::test(start_paused = true)]
async fn results_are_sorted_by_address() {
    let fixture = Arc::new(
        FixtureExecutor::new()
            .host("192.168.1.20", FixtureHost::new())
            .host("192.168.1.3", FixtureHost::new())
            .host("192.168.1.100", FixtureHost::new())
            .with_delay(Duration::from_millis(5)),
    );
    let scanner = engine(&fixture, test_config());

    let hosts = scanner.discover_hosts("192.168.1.0/24").await.unwrap();

    assert_eq!(hosts, vec!["192.168.1.3", "192.168.1.20", "192.168.1.100"]);
}

#[tokio::test(start_paused = true)]
async fn malformed_range_fails_before_probing() {
    let fixture = Arc::new(FixtureExecutor::new());
    let scanner = engine(&fixture, test_config());

    let result = scanner.discover_hosts("10.0.0.0/33").await;

    assert!(matches!(result, Err(ScanError::InvalidRange { .. })));
    assert_eq!(fixture.total_probes(), 0);
}

#[tokio::test(start_paused = true)]
async fn oversized_range_is_rejected() {
    let fixture = Arc::new(FixtureExecutor::new());
    let mut config = test_config();
    config.max_range_size = 16;
    let scanner = engine(&fixture, config);

    let result = scanner.discover_hosts("10.0.0.0/24").await;

    assert!(matches!(result, Err(ScanError::InvalidRange { .. })));
    assert_eq!(fixture.total_probes(), 0);
}

#[tokio::test(start_paused = true)]
async fn liveness_fault_aborts_discovery() {
    let fixture = Arc::new(
        FixtureExecutor::new()
            .host("10.0.0.1", FixtureHost::new())
            .fault_on(ProbeKind::Liveness),
    );
    let scanner = engine(&fixture, test_config());

    let result = scanner.discover_hosts("10.0.0.0/30").await;

    assert!(matches!(result, Err(ScanError::ExecutorFault(_))));
}
