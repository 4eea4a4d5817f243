use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use netsurvey_common::error::ScanError;
use netsurvey_common::scanning::NetworkScanner;
use netsurvey_common::wireless::{WirelessNetwork, WirelessScanner};
use netsurvey_core::ScanEngine;
use pnet::util::MacAddr;
use tokio::time::{self, Instant};

use crate::fixture::{test_config, FixtureExecutor, FixtureHost, FixtureWireless};

fn home_network() -> FixtureExecutor {
    FixtureExecutor::new()
        .host(
            "192.168.7.10",
            FixtureHost::new()
                .tcp(1883, None)
                .mac(MacAddr::new(0x24, 0x0a, 0xc4, 0x12, 0x34, 0x56)),
        )
        .host(
            "192.168.7.11",
            FixtureHost::new()
                .tcp(554, Some(b"RTSP/1.0 200 OK\r\nCSeq: 1\r\nServer: Hipcam RealServer/V1.0\r\n\r\n"))
                .tcp(80, Some(b"HTTP/1.1 200 OK\r\nServer: uc-httpd 1.0.0\r\n\r\n")),
        )
        .host(
            "192.168.7.20",
            FixtureHost::new()
                .tcp(22, Some(b"SSH-2.0-OpenSSH_9.6\r\n"))
                .tcp(445, None),
        )
}

fn access_points() -> Vec<WirelessNetwork> {
    vec![WirelessNetwork {
        ssid: "HomeNet".into(),
        bssid: Some("aa:bb:cc:dd:ee:01".into()),
        signal: Some(-52),
        channel: Some(6),
        security: Some("WPA2".into()),
    }]
}

fn surveyor(fixture: &Arc<FixtureExecutor>, local_scope: Option<&str>) -> ScanEngine {
    ScanEngine::builder(test_config())
        .executor(fixture.clone())
        .wireless(Arc::new(FixtureWireless(access_points())))
        .local_scope(local_scope.map(str::to_string))
        .build()
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn classifies_iot_devices_in_requested_range() {
    let fixture = Arc::new(home_network());
    let scanner = surveyor(&fixture, None);

    let survey = scanner.scan_wireless_iot(Some("192.168.7.0/27")).await.unwrap();

    assert_eq!(survey.network_range.as_deref(), Some("192.168.7.0/27"));
    assert_eq!(survey.wireless_networks, access_points());

    let ips: Vec<String> = survey.iot_devices.iter().map(|d| d.ip.to_string()).collect();
    assert_eq!(ips, vec!["192.168.7.10", "192.168.7.11"]);

    let plug = &survey.iot_devices[0];
    assert_eq!(plug.vendor.as_deref(), Some("Espressif Inc."));
    assert!((plug.confidence - 0.8).abs() < 1e-9, "{}", plug.confidence);
    assert!(plug.notes.as_deref().unwrap_or_default().contains("mqtt"));

    for device in &survey.iot_devices {
        assert!(device.confidence > 0.0 && device.confidence <= 1.0);
    }
}

#[tokio::test(start_paused = true)]
async fn classification_is_deterministic() {
    let fixture = Arc::new(home_network());
    let scanner = surveyor(&fixture, None);

    let first = scanner.scan_wireless_iot(Some("192.168.7.0/27")).await.unwrap();
    let second = scanner.scan_wireless_iot(Some("192.168.7.0/27")).await.unwrap();

    assert_eq!(first.iot_devices, second.iot_devices);
}

#[tokio::test(start_paused = true)]
async fn falls_back_to_local_scope() {
    let fixture = Arc::new(home_network());
    let scanner = surveyor(&fixture, Some("192.168.7.8/29"));

    let survey = scanner.scan_wireless_iot(None).await.unwrap();

    assert_eq!(survey.network_range, None);
    assert_eq!(survey.iot_devices.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn without_scope_only_wireless_is_reported() {
    let fixture = Arc::new(home_network());
    let scanner = surveyor(&fixture, None);

    let survey = scanner.scan_wireless_iot(None).await.unwrap();

    assert!(survey.iot_devices.is_empty());
    assert_eq!(survey.wireless_networks.len(), 1);
    assert_eq!(fixture.total_probes(), 0);
}

#[tokio::test(start_paused = true)]
async fn invalid_survey_range_is_rejected() {
    let fixture = Arc::new(home_network());
    let scanner = surveyor(&fixture, None);

    let result = scanner.scan_wireless_iot(Some("192.168.7.0/40")).await;

    assert!(matches!(result, Err(ScanError::InvalidRange { .. })));
}

/// A radio whose scan takes far longer than any reasonable deadline.
struct StalledRadio(Duration);

#[async_trait]
impl WirelessScanner for StalledRadio {
    async fn scan_networks(&self) -> Vec<WirelessNetwork> {
        time::sleep(self.0).await;
        access_points()
    }
}

#[tokio::test(start_paused = true)]
async fn slow_wireless_scan_is_cut_at_the_deadline() {
    let fixture = Arc::new(home_network());
    let mut config = test_config();
    config.scan_deadline_secs = 5;
    let scanner = ScanEngine::builder(config)
        .executor(fixture.clone())
        .wireless(Arc::new(StalledRadio(Duration::from_secs(60))))
        .build()
        .unwrap();

    let started = Instant::now();
    let survey = scanner.scan_wireless_iot(Some("192.168.7.8/30")).await.unwrap();

    assert!(started.elapsed() <= Duration::from_secs(6), "{:?}", started.elapsed());
    assert!(survey.wireless_networks.is_empty());
}

#[tokio::test(start_paused = true)]
async fn oversized_local_scope_skips_classification() {
    let fixture = Arc::new(home_network());
    let scanner = surveyor(&fixture, Some("10.0.0.0/8"));

    let survey = scanner.scan_wireless_iot(None).await.unwrap();

    assert!(survey.iot_devices.is_empty());
    assert_eq!(survey.network_range, None);
    assert_eq!(survey.wireless_networks.len(), 1);
    assert_eq!(fixture.total_probes(), 0);
}

#[tokio::test(start_paused = true)]
async fn oversized_requested_range_is_still_rejected() {
    let fixture = Arc::new(home_network());
    let scanner = surveyor(&fixture, None);

    let result = scanner.scan_wireless_iot(Some("10.0.0.0/8")).await;

    assert!(matches!(result, Err(ScanError::InvalidRange { .. })));
}
