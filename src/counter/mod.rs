//! Pulse counting: debounce engine plus the shared counter bank.
//!
//! [`PulseCounter`] is built to live in a `static`: the edge ISR and the
//! debounce poll timer callback both call into it. Channel state is guarded
//! by a critical-section mutex so an edge can never interleave with a poll
//! pass; the counts themselves are atomics, so the worker and command path
//! read and clear them without entering the critical section.

pub mod bank;
pub mod debounce;

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Duration;

use crate::app::ports::{PinPort, TimerPort};

use bank::CounterBank;
use debounce::{ChannelState, DebounceEngine};

/// Counting front-end shared between interrupt, timer and task context.
pub struct PulseCounter {
    bank: CounterBank,
    engine: Mutex<CriticalSectionRawMutex, RefCell<DebounceEngine>>,
}

impl PulseCounter {
    pub const fn new(poll_interval: Duration) -> Self {
        Self {
            bank: CounterBank::new(),
            engine: Mutex::new(RefCell::new(DebounceEngine::new(poll_interval))),
        }
    }

    /// Put every input into the armed state. Call once at init, before
    /// interrupts are enabled.
    pub fn start(&self, pins: &mut impl PinPort) {
        self.engine.lock(|e| e.borrow_mut().arm_all(pins));
    }

    /// Edge ISR entry point. Returns `true` if the edge was counted.
    pub fn on_edge(
        &self,
        channel: usize,
        pins: &mut impl PinPort,
        timer: &mut impl TimerPort,
    ) -> bool {
        self.engine
            .lock(|e| e.borrow_mut().on_edge(channel, &self.bank, pins, timer))
    }

    /// Debounce poll timer entry point. Returns `true` while polling
    /// continues.
    pub fn on_poll(&self, pins: &mut impl PinPort, timer: &mut impl TimerPort) -> bool {
        self.engine.lock(|e| e.borrow_mut().on_poll(pins, timer))
    }

    pub fn channel_state(&self, channel: usize) -> Option<ChannelState> {
        self.engine.lock(|e| e.borrow().state(channel))
    }

    pub fn any_settling(&self) -> bool {
        self.engine.lock(|e| e.borrow().any_settling())
    }

    pub fn bank(&self) -> &CounterBank {
        &self.bank
    }
}
