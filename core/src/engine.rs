//! # Scan Engine
//!
//! Ties the components together and implements [`NetworkScanner`].
//!
//! A network scan walks `Started → Discovering → PerHostScanning →
//! Aggregating → Completed`, or ends in `Failed` when the executor faults.
//! Every invocation gets its own deadline; probes that cannot finish before
//! it count as timeouts, so a scan that runs out of time still returns a
//! valid, partial topology.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::{FutureExt, StreamExt, TryStreamExt, stream};
use netsurvey_common::config::ScanConfig;
use netsurvey_common::error::{ProbeFailure, ScanError, ScanResult};
use netsurvey_common::network::host::{Host, PortState, Protocol};
use netsurvey_common::network::target::NetworkRange;
use netsurvey_common::network::topology::NetworkTopology;
use netsurvey_common::probe::{ProbeExecutor, ProbeKind, ProbeTarget};
use netsurvey_common::scanning::{self, NetworkScanner, ScanType};
use netsurvey_common::signatures::SignatureTable;
use netsurvey_common::vendors::{NoVendors, VendorRepository};
use netsurvey_common::wireless::{NoWireless, WirelessIoTScan, WirelessScanner};
use tokio::time::{self, Instant};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::discovery::HostDiscoverer;
use crate::fingerprint::{Evidence, Fingerprinter};
use crate::phase::{PhaseTracker, ScanPhase};
use crate::pool::ProbePool;
use crate::ports::{PortScanner, ScanProfile};
use crate::survey::{HostReport, Surveyor};

pub struct ScanEngine {
    config: Arc<ScanConfig>,
    pool: Arc<ProbePool>,
    discoverer: HostDiscoverer,
    ports: PortScanner,
    fingerprinter: Fingerprinter,
    surveyor: Surveyor,
    signatures: Arc<SignatureTable>,
}

/// Assembles a [`ScanEngine`] from its collaborators.
pub struct ScanEngineBuilder {
    config: ScanConfig,
    executor: Option<Arc<dyn ProbeExecutor>>,
    pool: Option<Arc<ProbePool>>,
    vendors: Arc<dyn VendorRepository>,
    wireless: Arc<dyn WirelessScanner>,
    signatures: Option<SignatureTable>,
    local_scope: Option<String>,
}

impl ScanEngineBuilder {
    pub fn executor(mut self, executor: Arc<dyn ProbeExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Shares an existing pool, and with it the process-wide probe limit.
    pub fn pool(mut self, pool: Arc<ProbePool>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn vendors(mut self, vendors: Arc<dyn VendorRepository>) -> Self {
        self.vendors = vendors;
        self
    }

    pub fn wireless(mut self, wireless: Arc<dyn WirelessScanner>) -> Self {
        self.wireless = wireless;
        self
    }

    pub fn signatures(mut self, signatures: SignatureTable) -> Self {
        self.signatures = Some(signatures);
        self
    }

    /// Range surveyed for IoT devices when none is requested and the
    /// configuration names none.
    pub fn local_scope(mut self, scope: Option<String>) -> Self {
        self.local_scope = scope;
        self
    }

    pub fn build(self) -> ScanResult<ScanEngine> {
        self.config.validate()?;

        let signatures = match (self.signatures, &self.config.signatures) {
            (Some(table), _) => table,
            (None, Some(path)) => SignatureTable::load(path)?,
            (None, None) => SignatureTable::builtin(),
        };
        let signatures = Arc::new(signatures);

        let pool = match (self.pool, self.executor) {
            (Some(pool), _) => pool,
            (None, Some(executor)) => Arc::new(ProbePool::new(
                executor,
                self.config.max_in_flight_probes,
                self.config.timeouts.clone(),
            )),
            (None, None) => return Err(ScanError::Config("no probe executor configured".into())),
        };

        let scope = self.config.iot_scope.clone().or(self.local_scope);
        let config = Arc::new(self.config);

        Ok(ScanEngine {
            discoverer: HostDiscoverer::new(pool.clone(), config.discovery_fanout, config.liveness_retries),
            ports: PortScanner::new(pool.clone(), &config),
            fingerprinter: Fingerprinter::new(signatures.clone(), self.vendors),
            surveyor: Surveyor::new(self.wireless, signatures.clone(), scope),
            signatures,
            pool,
            config,
        })
    }
}

impl ScanEngine {
    pub fn builder(config: ScanConfig) -> ScanEngineBuilder {
        ScanEngineBuilder {
            config,
            executor: None,
            pool: None,
            vendors: Arc::new(NoVendors),
            wireless: Arc::new(NoWireless),
            signatures: None,
            local_scope: None,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn pool(&self) -> &Arc<ProbePool> {
        &self.pool
    }

    pub fn signatures(&self) -> &SignatureTable {
        &self.signatures
    }

    fn parse_range(&self, network_range: &str) -> ScanResult<NetworkRange> {
        NetworkRange::parse(network_range, self.config.max_range_size)
    }

    fn deadline(&self) -> Instant {
        Instant::now() + self.config.deadline()
    }

    /// [`NetworkScanner::scan_network`] with an explicit time budget.
    pub async fn scan_network_with_deadline(
        &self,
        network_range: &str,
        scan_type: &str,
        budget: Duration,
    ) -> ScanResult<NetworkTopology> {
        let scan_type: ScanType = scan_type.parse()?;
        let range = self.parse_range(network_range)?;
        let profile = ScanProfile::for_scan_type(scan_type, &self.config)?;

        let scan_id = Uuid::new_v4().to_string();
        let span = info_span!("scan", scan_id = %scan_id, range = %range, %scan_type);
        self.run_network_scan(scan_id, range, profile, Instant::now() + budget)
            .instrument(span)
            .await
    }

    async fn run_network_scan(
        &self,
        scan_id: String,
        range: NetworkRange,
        profile: ScanProfile,
        deadline: Instant,
    ) -> ScanResult<NetworkTopology> {
        let mut phases = PhaseTracker::start(&scan_id);
        let scan_start = Utc::now();

        phases.advance(ScanPhase::Discovering);
        let alive = self
            .discoverer
            .discover(&range, deadline)
            .await
            .map_err(|fault| phases.fail(fault))?;
        info!(alive = alive.len(), of = range.len(), "hosts responded");

        phases.advance(ScanPhase::PerHostScanning);
        let reports = self
            .inspect_hosts(alive, &profile, deadline)
            .await
            .map_err(|fault| phases.fail(fault))?;

        phases.advance(ScanPhase::Aggregating);
        let hosts: Vec<Host> = reports.into_iter().map(|report| report.host).collect();
        let scan_end = Utc::now();
        let topology = NetworkTopology::assemble(
            scan_id,
            range.as_str().to_string(),
            range.len(),
            hosts,
            scan_start,
            scan_end,
        );

        phases.advance(ScanPhase::Completed);
        info!(
            active = topology.active_hosts,
            total = topology.total_hosts,
            duration_s = topology.duration,
            "scan complete"
        );
        Ok(topology)
    }

    /// [`NetworkScanner::scan_host`] with an explicit scan type.
    ///
    /// A host that ignores liveness probes is still port-scanned; it is
    /// reported up when any port answers.
    pub async fn scan_host_with(&self, ip: &str, scan_type: ScanType) -> ScanResult<Host> {
        let ip = scanning::parse_ip(ip)?;
        let profile = ScanProfile::for_scan_type(scan_type, &self.config)?;
        let deadline = self.deadline();
        let range = NetworkRange::parse(&ip.to_string(), 1)?;

        let alive = !self.discoverer.discover(&range, deadline).await?.is_empty();
        let report = self.inspect_host(ip, &profile, deadline).await?;

        let answered = report.host.ports.iter().any(|p| p.state != PortState::Filtered);
        if alive || answered {
            Ok(report.host)
        } else {
            debug!(%ip, "host did not answer");
            Ok(Host::down(ip))
        }
    }

    async fn inspect_hosts(
        &self,
        ips: Vec<IpAddr>,
        profile: &ScanProfile,
        deadline: Instant,
    ) -> Result<Vec<HostReport>, ProbeFailure> {
        stream::iter(ips)
            .map(|ip| self.inspect_host(ip, profile, deadline).boxed())
            .buffer_unordered(self.config.max_concurrent_hosts)
            .try_collect()
            .await
    }

    /// Ports, fingerprint and name of one host known to be up.
    async fn inspect_host(
        &self,
        ip: IpAddr,
        profile: &ScanProfile,
        deadline: Instant,
    ) -> Result<HostReport, ProbeFailure> {
        let executor = self.pool.executor();
        let report = self.ports.scan_ports(ip, profile, deadline).await?;

        let mut evidence = Evidence {
            ttl: report.ttl,
            window_size: report.window_size,
            mac: executor.neighbor_mac(ip),
        };
        if self.config.os_detection && executor.supports(ProbeKind::OsFingerprint) {
            let port = report
                .ports
                .iter()
                .find(|p| p.protocol == Protocol::Tcp && p.state == PortState::Open)
                .map_or(self.config.liveness_port, |p| p.number);
            match self.pool.probe(ProbeTarget::port(ip, port), ProbeKind::OsFingerprint, deadline).await {
                Ok(response) if response.ttl.is_some() => {
                    evidence.ttl = response.ttl;
                    evidence.window_size = response.window_size;
                }
                Err(ProbeFailure::Fault(reason)) => return Err(ProbeFailure::Fault(reason)),
                _ => {}
            }
        }

        let (os, vendor) = self.fingerprinter.fingerprint(ip, &evidence);
        let os = os.filter(|_| self.config.os_detection);
        let hostname = self.resolve_hostname(ip, deadline).await;

        let host = Host::up(ip)
            .with_ports(report.ports)
            .with_mac(evidence.mac)
            .with_hostname(hostname)
            .with_fingerprint(os, vendor);
        Ok(HostReport {
            host,
            banners: report.banners,
        })
    }

    async fn resolve_hostname(&self, ip: IpAddr, deadline: Instant) -> Option<String> {
        if !self.config.resolve_hostnames {
            return None;
        }
        let budget = self
            .config
            .timeouts
            .dns()
            .min(deadline.saturating_duration_since(Instant::now()));
        if budget.is_zero() {
            return None;
        }
        time::timeout(budget, self.pool.executor().resolve_hostname(ip, budget))
            .await
            .ok()
            .flatten()
    }

    async fn discover_sorted(&self, range: &NetworkRange, deadline: Instant) -> ScanResult<Vec<IpAddr>> {
        let mut alive = self.discoverer.discover(range, deadline).await?;
        alive.sort();
        Ok(alive)
    }

    async fn survey_iot(&self, network_range: Option<&str>, deadline: Instant) -> ScanResult<Vec<HostReport>> {
        let range = match network_range {
            Some(requested) => self.parse_range(requested)?,
            None => {
                let Some(scope) = self.surveyor.scope(None) else {
                    return Ok(Vec::new());
                };
                match self.parse_range(scope) {
                    Ok(range) => range,
                    Err(e) => {
                        warn!(%scope, "local scope cannot be surveyed, skipping IoT classification: {e}");
                        return Ok(Vec::new());
                    }
                }
            }
        };
        let alive = self.discover_sorted(&range, deadline).await?;
        let profile = ScanProfile::iot(&self.signatures);
        Ok(self.inspect_hosts(alive, &profile, deadline).await?)
    }
}

#[async_trait]
impl NetworkScanner for ScanEngine {
    async fn scan_network(&self, network_range: &str, scan_type: &str) -> ScanResult<NetworkTopology> {
        self.scan_network_with_deadline(network_range, scan_type, self.config.deadline())
            .await
    }

    async fn scan_host(&self, ip: &str) -> ScanResult<Host> {
        self.scan_host_with(ip, ScanType::Quick).await
    }

    async fn discover_hosts(&self, network_range: &str) -> ScanResult<Vec<String>> {
        let range = self.parse_range(network_range)?;
        let alive = self.discover_sorted(&range, self.deadline()).await?;
        Ok(alive.into_iter().map(|ip| ip.to_string()).collect())
    }

    async fn scan_wireless_iot(&self, network_range: Option<&str>) -> ScanResult<WirelessIoTScan> {
        if let Some(requested) = network_range {
            self.parse_range(requested)?;
        }
        let deadline = self.deadline();

        let wireless = async {
            time::timeout_at(deadline, self.surveyor.wireless_networks())
                .await
                .unwrap_or_else(|_elapsed| {
                    warn!("wireless survey did not finish before the deadline");
                    Vec::new()
                })
        };
        let (wireless_networks, reports) = tokio::join!(wireless, self.survey_iot(network_range, deadline));
        let iot_devices = self.surveyor.classify(&reports?);
        info!(
            networks = wireless_networks.len(),
            iot_devices = iot_devices.len(),
            "wireless/IoT survey complete"
        );

        Ok(WirelessIoTScan {
            wireless_networks,
            iot_devices,
            network_range: network_range.map(str::to_string),
            scanned_at: Utc::now(),
        })
    }
}
