//! Serial console commands.
//!
//! ```text
//! counter              usage
//! counter get          print every channel
//! counter send         publish now
//! counter period <N>   set publish period (hours)
//! counter reset        zero counters, restore default period
//! ```

use core::fmt::Write;

use embassy_time::Duration;

use crate::app::ports::{PublishPort, StoragePort, TimerPort};
use crate::app::service::CounterService;
use crate::scheduler::PublishTrigger;

/// Console command root.
pub const ROOT: &str = "counter";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Usage,
    Get,
    Send,
    Period(u8),
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleError {
    /// E01: Unknown command
    UnknownCommand,
    /// E02: Invalid value format
    InvalidValue,
    /// E03: Missing required argument
    MissingArg,
    /// E04: Value out of allowed range
    OutOfRange,
}

impl ConsoleError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownCommand => "E01",
            Self::InvalidValue => "E02",
            Self::MissingArg => "E03",
            Self::OutOfRange => "E04",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::UnknownCommand => "unknown command",
            Self::InvalidValue => "invalid value",
            Self::MissingArg => "missing argument",
            Self::OutOfRange => "out of range",
        }
    }
}

impl core::fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// Parse one console line. Lines for other modules are
/// [`ConsoleError::UnknownCommand`].
pub fn parse(line: &str) -> Result<ConsoleCommand, ConsoleError> {
    let mut parts = line.split_whitespace();
    if parts.next() != Some(ROOT) {
        return Err(ConsoleError::UnknownCommand);
    }

    match parts.next() {
        None => Ok(ConsoleCommand::Usage),
        Some("get") => Ok(ConsoleCommand::Get),
        Some("send") => Ok(ConsoleCommand::Send),
        Some("reset") => Ok(ConsoleCommand::Reset),
        Some("period") => {
            let raw = parts.next().ok_or(ConsoleError::MissingArg)?;
            raw.parse::<u8>()
                .map(ConsoleCommand::Period)
                .map_err(|_| ConsoleError::InvalidValue)
        }
        Some(_) => Err(ConsoleError::UnknownCommand),
    }
}

/// Run a parsed command, writing its output to `out`.
pub fn execute<S: StoragePort>(
    cmd: ConsoleCommand,
    service: &mut CounterService<'_, S>,
    timer: &mut impl TimerPort,
    queue: &impl PublishPort,
    out: &mut impl Write,
) -> Result<(), ConsoleError> {
    // Output is best-effort; a full buffer truncates it.
    match cmd {
        ConsoleCommand::Usage => {
            let _ = writeln!(out, "counter get - get results now");
            let _ = writeln!(out, "counter send - get and send results now");
            let _ = writeln!(out, "counter period <N> - set period to N hours");
            let _ = writeln!(out, "counter reset - reset settings to default, counter to zero");
        }
        ConsoleCommand::Get => {
            for (i, count) in service.counts().iter().enumerate() {
                let _ = writeln!(out, "Counter {}: {}", i, count);
            }
        }
        ConsoleCommand::Send => {
            service.request_publish(PublishTrigger::Console, Duration::from_ticks(0), timer, queue);
        }
        ConsoleCommand::Period(hours) => {
            service
                .set_period(hours, timer)
                .map_err(|_| ConsoleError::OutOfRange)?;
            let _ = writeln!(out, "Period set to {} hour(s)", hours);
        }
        ConsoleCommand::Reset => service.reset_defaults(timer),
    }
    Ok(())
}
