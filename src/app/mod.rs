//! Application core: counter configuration, persistence and command
//! handling, zero direct I/O.
//!
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod ports;
pub mod service;
