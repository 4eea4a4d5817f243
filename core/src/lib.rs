//! # netsurvey-core
//!
//! The scanning engine and the adapters that connect it to a real network.
//!
//! [`ScanEngine`] implements [`NetworkScanner`](netsurvey_common::scanning::NetworkScanner)
//! on top of a [`ProbeExecutor`](netsurvey_common::probe::ProbeExecutor). The
//! production executor lives in [`executor`]; tests plug in their own.

pub mod discovery;
pub mod engine;
pub mod executor;
pub mod fingerprint;
pub mod iot;
pub mod network;
pub mod phase;
pub mod pool;
pub mod ports;
pub mod survey;
pub mod system;
pub mod vendors;
pub mod wireless;

pub use engine::{ScanEngine, ScanEngineBuilder};
pub use executor::NetProbeExecutor;
pub use pool::ProbePool;
pub use system::system_engine;
