//! Wire formats and inter-context plumbing.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  remote bus ──▶ command::decode ──▶ CounterService        │
//! │             ◀── Reply::to_bytes ◀──┘                      │
//! │                                                          │
//! │  PublishWorker ──▶ codec::encode ──▶ TelemetrySink        │
//! │                                                          │
//! │  ISR / timers ──▶ channels::PublishQueue ──▶ worker       │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod channels;
pub mod codec;
pub mod command;
