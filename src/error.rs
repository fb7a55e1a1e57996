//! Unified error types for the pulse-counter firmware.
//!
//! Every failure in this module is represented as a value, never an unwind.
//! Most of them are recovered where they happen (invalid stored config,
//! malformed remote commands); the rest surface as reply status codes or
//! log lines. All variants are `Copy` so they can be passed out of
//! interrupt-adjacent code without allocation.

use core::fmt;

use crate::app::ports::{ConfigError, StorageError};
use crate::rpc::command::CommandError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Requested publish period is `0` or above the configured maximum.
    /// The previous period is retained.
    InvalidPeriod(u8),
    /// A remote command frame was malformed (wrong length, unknown opcode).
    Command(CommandError),
    /// The persisted counter image is missing, corrupt or erased.
    Config(ConfigError),
    /// The persistent store rejected a read or write.
    Storage(StorageError),
    /// Module initialisation failed (settings out of range, no worker).
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPeriod(p) => write!(f, "invalid publish period: {p}"),
            Self::Command(e) => write!(f, "command: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
