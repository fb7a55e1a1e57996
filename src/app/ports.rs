//! Port traits: the hexagonal boundary between counter logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ PulseCounter / CounterService / PublishWorker
//! ```
//!
//! Driven adapters (pins, timers, flash, outbound radio) implement these
//! traits. The domain consumes them via generics injected at call sites,
//! so none of it touches hardware directly and all of it runs on the host.
//!
//! Every port method is infallible from the caller's point of view except
//! storage: pin and timer calls are best-effort register writes.

use embassy_time::Duration;
use embedded_hal::digital::PinState;

use crate::rpc::codec::TelemetryFrame;
use crate::scheduler::PublishRequest;

// ───────────────────────────────────────────────────────────────
// Pin port (driven adapter: domain ↔ GPIO)
// ───────────────────────────────────────────────────────────────

/// A digital input owned by this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Line {
    /// Counting input, `0..NUM_CHANNELS`.
    Counter(usize),
    /// "Connect" push-button that forces an early publish.
    Connect,
}

/// Electrical configuration of a counting input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    /// Input with pull-up, able to detect edges.
    InputPullUp,
    /// Disconnected / analog. No current through the pull-up, no edges.
    HighZ,
}

/// Pin-level driver consumed by the debounce engine and the worker.
pub trait PinPort {
    /// Sample the current level. Only meaningful in [`PinMode::InputPullUp`].
    fn read(&mut self, line: Line) -> PinState;

    /// Switch the pin's electrical mode.
    fn set_mode(&mut self, line: Line, mode: PinMode);

    /// Enable the falling-edge interrupt.
    fn arm_interrupt(&mut self, line: Line);

    /// Disable the edge interrupt.
    fn disarm_interrupt(&mut self, line: Line);
}

// ───────────────────────────────────────────────────────────────
// Timer port (driven adapter: domain ↔ timer service)
// ───────────────────────────────────────────────────────────────

/// The two one-shot timers this module owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerId {
    /// Shared debounce poll, armed while any channel is settling.
    DebouncePoll,
    /// Publish cadence and delayed one-shot publishes.
    Publish,
}

/// One-shot timer service. Expiry callbacks are wired by the adapter.
pub trait TimerPort {
    /// Arm `timer` to expire after `delay`, replacing any pending expiry.
    fn schedule_once(&mut self, timer: TimerId, delay: Duration);

    /// Disarm `timer`. No-op when not armed.
    fn cancel(&mut self, timer: TimerId);

    /// Whether `timer` has a pending expiry.
    fn is_scheduled(&self, timer: TimerId) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage for the counter image.
///
/// Write operations MUST be atomic: no partial writes on power loss.
/// The ESP-IDF NVS API guarantees this natively; in-memory simulation
/// achieves it trivially.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Outbound ports
// ───────────────────────────────────────────────────────────────

/// Outbound transport for telemetry frames. Fire-and-forget.
pub trait TelemetrySink {
    fn emit(&mut self, frame: &TelemetryFrame);
}

/// Single-slot handoff into the worker task.
///
/// Returns `false` when the request was coalesced into one already pending.
pub trait PublishPort {
    fn post(&self, request: PublishRequest) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Problems with the persisted counter image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No image found in storage (first boot).
    NotFound,
    /// Stored image failed to deserialize.
    Corrupted,
    /// Image decoded but is marked invalid or erased.
    Invalid,
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::Invalid => write!(f, "config marked invalid"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<StorageError> for ConfigError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound => Self::NotFound,
            StorageError::Full | StorageError::IoError => Self::IoError,
        }
    }
}
