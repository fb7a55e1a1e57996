//! Remote command wire format.
//!
//! ```text
//! request: [opcode: u8, payload...]
//!   1 SET_PERIOD  payload = [hours: u8]
//!   2 POLL        no payload
//!   3 RESET       no payload
//!
//! reply:   [module_id: u8, status: u8]     status 0 = ok, 253 = rejected
//! ```
//!
//! A frame that fails to decode produces no reply at all. On this channel
//! the missing reply is the error signal, so the decoder reports *why* only
//! for logging.

use crate::app::commands::AppCommand;

/// Known opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    SetPeriod = 1,
    Poll = 2,
    Reset = 3,
}

impl Opcode {
    pub fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(Self::SetPeriod),
            2 => Some(Self::Poll),
            3 => Some(Self::Reset),
            _ => None,
        }
    }

    /// Exact payload length the opcode requires.
    pub const fn payload_len(self) -> usize {
        match self {
            Self::SetPeriod => 1,
            Self::Poll | Self::Reset => 0,
        }
    }
}

/// Why a command frame was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Zero-length frame.
    Empty,
    /// Reserved or unknown opcode.
    UnknownOpcode(u8),
    /// Payload length does not match the opcode.
    BadLength { opcode: Opcode, len: usize },
}

impl core::fmt::Display for CommandError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty frame"),
            Self::UnknownOpcode(op) => write!(f, "unknown opcode {}", op),
            Self::BadLength { opcode, len } => write!(
                f,
                "{:?} expects {} payload byte(s), got {}",
                opcode,
                opcode.payload_len(),
                len
            ),
        }
    }
}

/// Decode a request frame.
pub fn decode(frame: &[u8]) -> Result<AppCommand, CommandError> {
    let (&raw, payload) = frame.split_first().ok_or(CommandError::Empty)?;
    let opcode = Opcode::from_u8(raw).ok_or(CommandError::UnknownOpcode(raw))?;

    if payload.len() != opcode.payload_len() {
        return Err(CommandError::BadLength {
            opcode,
            len: payload.len(),
        });
    }

    Ok(match opcode {
        Opcode::SetPeriod => AppCommand::SetPeriod(payload[0]),
        Opcode::Poll => AppCommand::Poll,
        Opcode::Reset => AppCommand::Reset,
    })
}

/// Encode a request frame (controller side, tests, console bridging).
pub fn encode(cmd: AppCommand) -> heapless::Vec<u8, 2> {
    let mut out = heapless::Vec::new();
    // Capacity 2 covers the longest request; pushes cannot fail.
    match cmd {
        AppCommand::SetPeriod(hours) => {
            let _ = out.push(Opcode::SetPeriod as u8);
            let _ = out.push(hours);
        }
        AppCommand::Poll => {
            let _ = out.push(Opcode::Poll as u8);
        }
        AppCommand::Reset => {
            let _ = out.push(Opcode::Reset as u8);
        }
    }
    out
}

/// Reply status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReplyStatus {
    Ok = 0,
    Rejected = 253,
}

/// Synchronous two-byte reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reply {
    pub module_id: u8,
    pub status: ReplyStatus,
}

impl Reply {
    pub fn ok(module_id: u8) -> Self {
        Self {
            module_id,
            status: ReplyStatus::Ok,
        }
    }

    pub fn rejected(module_id: u8) -> Self {
        Self {
            module_id,
            status: ReplyStatus::Rejected,
        }
    }

    pub fn to_bytes(self) -> [u8; 2] {
        [self.module_id, self.status as u8]
    }
}
