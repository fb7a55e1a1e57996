//! Pulse-counter firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod console;
pub mod counter;
pub mod error;
pub mod pins;
pub mod rpc;
pub mod scheduler;
pub mod worker;

// Hardware-facing modules compile on the host against simulation
// fallbacks inside each file.
pub mod adapters;
pub mod drivers;
