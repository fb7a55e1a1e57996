//! Inter-context channels.
//!
//! Uses `embassy-sync` bounded channels to bridge interrupt and timer
//! context with the single worker task. All of them live in `static`s
//! owned by the binary; none allocate.
//!
//! ```text
//!  edge/button ISR ─┐
//!  publish timer   ─┼─ PublishRequest ─▶ ┌──────────────┐
//!  command path    ─┘                    │  Worker task │
//!  remote bus / console ── Inbound ────▶ │              │
//!  remote bus ◀──────────── reply ────── └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::Vec;

use crate::app::ports::PublishPort;
use crate::console::ConsoleCommand;
use crate::scheduler::PublishRequest;

/// Pending publish requests the worker may fall behind by.
pub const PUBLISH_QUEUE_DEPTH: usize = 4;

/// Longest remote command frame accepted off the bus.
pub const COMMAND_FRAME_MAX: usize = 8;

/// Channel depth for inbound commands and outbound replies.
const INBOUND_DEPTH: usize = 4;

/// Raw command frame as received.
pub type CommandFrame = Vec<u8, COMMAND_FRAME_MAX>;

/// Work for the worker that is not a publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Frame from the remote command bus; answered on [`ReplyChannel`].
    Remote(CommandFrame),
    /// Parsed console line; answered on the log.
    Console(ConsoleCommand),
}

pub type CommandChannel = Channel<CriticalSectionRawMutex, Inbound, INBOUND_DEPTH>;
pub type ReplyChannel = Channel<CriticalSectionRawMutex, [u8; 2], INBOUND_DEPTH>;

/// Bounded publish queue feeding the worker.
///
/// Posting never blocks, so it is safe from interrupt and timer context.
/// When the queue is full the new request is dropped: a publish already
/// pending will read the same counters, so nothing is lost but the
/// duplicate.
pub struct PublishQueue {
    inner: Channel<CriticalSectionRawMutex, PublishRequest, PUBLISH_QUEUE_DEPTH>,
}

impl PublishQueue {
    pub const fn new() -> Self {
        Self {
            inner: Channel::new(),
        }
    }

    pub async fn receive(&self) -> PublishRequest {
        self.inner.receive().await
    }

    pub fn try_receive(&self) -> Option<PublishRequest> {
        self.inner.try_receive().ok()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for PublishQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl PublishPort for PublishQueue {
    fn post(&self, request: PublishRequest) -> bool {
        // No logging: this runs in interrupt context.
        self.inner.try_send(request).is_ok()
    }
}
