//! Wiring of the engine against the machine it runs on.

use std::sync::Arc;

use netsurvey_common::config::ScanConfig;
use netsurvey_common::error::ScanResult;
use tracing::{debug, warn};

use crate::engine::ScanEngine;
use crate::executor::NetProbeExecutor;
use crate::network::interface;
use crate::vendors::MacOuiRepo;
use crate::wireless::SystemWirelessScanner;

/// A [`ScanEngine`] backed by real sockets, the bundled OUI registry and the
/// platform wireless tooling. The local LAN becomes the default IoT scope.
pub fn system_engine(config: ScanConfig) -> ScanResult<ScanEngine> {
    let executor = NetProbeExecutor::new(config.liveness_port);
    if !executor.is_privileged() {
        debug!("probing without raw sockets");
    }

    let local_scope = match interface::lan_network() {
        Ok(Some(network)) => Some(format!("{}/{}", network.network(), network.prefix())),
        Ok(None) => None,
        Err(e) => {
            warn!("could not determine the local network: {e}");
            None
        }
    };

    ScanEngine::builder(config)
        .executor(Arc::new(executor))
        .vendors(Arc::new(MacOuiRepo))
        .wireless(Arc::new(SystemWirelessScanner::default()))
        .local_scope(local_scope)
        .build()
}
