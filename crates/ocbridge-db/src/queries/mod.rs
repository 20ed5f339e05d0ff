//! Database query modules.
//!
//! - config: the singleton configuration record
//! - endpoints: discovered service endpoints keyed by (config, kind)

pub mod config;
pub mod endpoints;
