//! Per-channel event counters shared between interrupt and task context.
//!
//! The edge ISR increments, the worker snapshots, the command path clears.
//! Each counter is a single `AtomicU32`, so every read and write is
//! indivisible without masking interrupts. A snapshot is four independent
//! loads: an edge landing mid-snapshot is either in it or in the next one,
//! never lost.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::config::NUM_CHANNELS;

/// Fixed bank of counters, one per input, alive for the device lifetime.
pub struct CounterBank {
    counts: [AtomicU32; NUM_CHANNELS],
}

impl CounterBank {
    pub const fn new() -> Self {
        Self {
            counts: [const { AtomicU32::new(0) }; NUM_CHANNELS],
        }
    }

    /// Count one event on `channel`. Safe from interrupt context.
    /// Wraps at `u32::MAX`. Out-of-range channels are ignored.
    pub fn record(&self, channel: usize) {
        if let Some(c) = self.counts.get(channel) {
            c.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Current count of a single channel (0 for an unknown channel).
    pub fn get(&self, channel: usize) -> u32 {
        self.counts
            .get(channel)
            .map_or(0, |c| c.load(Ordering::Relaxed))
    }

    /// Read every channel.
    pub fn snapshot(&self) -> [u32; NUM_CHANNELS] {
        core::array::from_fn(|i| self.counts[i].load(Ordering::Relaxed))
    }

    /// Overwrite every channel, e.g. with a value loaded from flash.
    pub fn restore(&self, counts: &[u32; NUM_CHANNELS]) {
        for (slot, &value) in self.counts.iter().zip(counts) {
            slot.store(value, Ordering::Relaxed);
        }
    }

    /// Zero every channel.
    pub fn clear(&self) {
        self.restore(&[0; NUM_CHANNELS]);
    }
}

impl Default for CounterBank {
    fn default() -> Self {
        Self::new()
    }
}
