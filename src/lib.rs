//! Ocbridge - Opencast configuration and REST bridge
//!
//! This library crate exposes the core functionality for integration testing.

pub mod cache;
pub mod client;
pub mod config;
pub mod reconcile;
pub mod server;
