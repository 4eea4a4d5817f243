//! # netsurvey-common
//!
//! Shared vocabulary of the workspace: the data model handed to callers, the
//! error taxonomy, configuration, signature tables, and the traits (ports)
//! implemented by the engine and its adapters.

pub mod config;
pub mod error;
pub mod network;
pub mod probe;
pub mod scanning;
pub mod signatures;
pub mod vendors;
pub mod wireless;
