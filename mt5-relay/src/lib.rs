// Library interface for the MT5 relay server
// Exposes modules for the binaries and integration tests

pub mod adapters;
pub mod application;
pub mod bootstrap;
pub mod client;
pub mod config;
pub mod domain;
pub mod logging;
pub mod ports;
