//! Edge-count debounce state machine.
//!
//! Each counting input is either **Armed** (pulled-up input, falling-edge
//! interrupt enabled) or **Settling** (interrupt disabled, pin parked in
//! high-impedance so a bouncing contact neither retriggers nor burns
//! current through the pull-up).
//!
//! ```text
//!            falling edge (ISR)
//!   Armed ───────────────────────▶ Settling{last: Low}
//!     ▲        count += 1               │
//!     │                                 │ poll: pull-up, sample, park
//!     │   same level twice, High        │
//!     └─────────────────────────────────┤
//!                                       │ level changed / still Low
//!                                       └──▶ Settling{last: level}
//! ```
//!
//! The edge itself is the counted event, so a count is visible
//! immediately; a bounce burst can add at most one false count.
//! One shared poll timer serves every settling channel and is only
//! rescheduled while at least one channel is still unsettled.

use embassy_time::Duration;
use embedded_hal::digital::PinState;

use crate::app::ports::{Line, PinMode, PinPort, TimerId, TimerPort};
use crate::config::NUM_CHANNELS;

use super::bank::CounterBank;

/// Per-channel debounce state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Edge interrupt enabled.
    Armed,
    /// Interrupt disabled, polled until the level rests high.
    Settling { last_level: PinState },
}

/// Debounce engine for all counting inputs.
pub struct DebounceEngine {
    channels: [ChannelState; NUM_CHANNELS],
    poll_interval: Duration,
}

impl DebounceEngine {
    pub const fn new(poll_interval: Duration) -> Self {
        Self {
            channels: [ChannelState::Armed; NUM_CHANNELS],
            poll_interval,
        }
    }

    /// Configure every input as a pulled-up, edge-armed pin.
    pub fn arm_all(&mut self, pins: &mut impl PinPort) {
        for (i, state) in self.channels.iter_mut().enumerate() {
            *state = ChannelState::Armed;
            let line = Line::Counter(i);
            pins.set_mode(line, PinMode::InputPullUp);
            pins.arm_interrupt(line);
        }
    }

    pub fn state(&self, channel: usize) -> Option<ChannelState> {
        self.channels.get(channel).copied()
    }

    pub fn is_settling(&self, channel: usize) -> bool {
        matches!(self.state(channel), Some(ChannelState::Settling { .. }))
    }

    /// Whether any channel still needs the poll timer.
    pub fn any_settling(&self) -> bool {
        self.channels
            .iter()
            .any(|s| matches!(s, ChannelState::Settling { .. }))
    }

    /// Falling edge on `channel`. Runs in interrupt context.
    ///
    /// Returns `true` if the edge was counted. Edges on a channel that is
    /// already settling are ignored.
    pub fn on_edge(
        &mut self,
        channel: usize,
        bank: &CounterBank,
        pins: &mut impl PinPort,
        timer: &mut impl TimerPort,
    ) -> bool {
        let Some(state) = self.channels.get_mut(channel) else {
            return false;
        };
        if matches!(state, ChannelState::Settling { .. }) {
            return false;
        }

        *state = ChannelState::Settling {
            last_level: PinState::Low,
        };
        let line = Line::Counter(channel);
        pins.disarm_interrupt(line);
        pins.set_mode(line, PinMode::HighZ);
        bank.record(channel);

        if !timer.is_scheduled(TimerId::DebouncePoll) {
            timer.schedule_once(TimerId::DebouncePoll, self.poll_interval);
        }
        true
    }

    /// Shared poll timer expiry. Samples every settling channel once.
    ///
    /// Returns `true` if the timer was rescheduled because some channel is
    /// still bouncing or held low.
    pub fn on_poll(&mut self, pins: &mut impl PinPort, timer: &mut impl TimerPort) -> bool {
        let mut unsettled = false;

        for (i, state) in self.channels.iter_mut().enumerate() {
            let ChannelState::Settling { last_level } = *state else {
                continue;
            };
            let line = Line::Counter(i);

            pins.set_mode(line, PinMode::InputPullUp);
            let level = pins.read(line);
            pins.set_mode(line, PinMode::HighZ);

            if level != last_level {
                *state = ChannelState::Settling { last_level: level };
                unsettled = true;
            } else if level == PinState::High {
                *state = ChannelState::Armed;
                pins.set_mode(line, PinMode::InputPullUp);
                pins.arm_interrupt(line);
            } else {
                unsettled = true;
            }
        }

        if unsettled {
            timer.schedule_once(TimerId::DebouncePoll, self.poll_interval);
        }
        unsettled
    }
}
