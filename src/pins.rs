//! GPIO assignments for the pulse-counter board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

use crate::app::ports::Line;
use crate::config::NUM_CHANNELS;

// ---------------------------------------------------------------------------
// Counting inputs (dry contact / open collector to GND, active low)
// ---------------------------------------------------------------------------

pub const COUNTER_GPIOS: [i32; NUM_CHANNELS] = [4, 5, 6, 7];

// ---------------------------------------------------------------------------
// Connect button (active low, forces a publish)
// ---------------------------------------------------------------------------

pub const CONNECT_BUTTON_GPIO: i32 = 0;

/// GPIO number behind a logical line, `None` for an unknown counter index.
pub fn gpio_for(line: Line) -> Option<i32> {
    match line {
        Line::Counter(i) => COUNTER_GPIOS.get(i).copied(),
        Line::Connect => Some(CONNECT_BUTTON_GPIO),
    }
}
