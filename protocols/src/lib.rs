//! Wire-level helpers: packet builders and parsers, service probe payloads
//! and the interpretation of what services send back.

pub mod banner;
pub mod dns;
pub mod icmp;
pub mod payloads;
pub mod services;
pub mod tcp;
