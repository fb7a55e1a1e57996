//! GPIO adapter: [`PinPort`] over the raw pin helpers.
//!
//! Zero-sized, so the edge ISR and the debounce timer callback can each
//! conjure one without sharing state. The pin registers are the state.

use embedded_hal::digital::PinState;

use crate::app::ports::{Line, PinMode, PinPort};
use crate::drivers::hw_init;
use crate::pins;

#[derive(Debug, Clone, Copy, Default)]
pub struct EspPins;

impl PinPort for EspPins {
    fn read(&mut self, line: Line) -> PinState {
        match pins::gpio_for(line) {
            Some(gpio) => PinState::from(hw_init::gpio_read(gpio)),
            // Unknown lines read as idle.
            None => PinState::High,
        }
    }

    fn set_mode(&mut self, line: Line, mode: PinMode) {
        let Some(gpio) = pins::gpio_for(line) else { return };
        match mode {
            PinMode::InputPullUp => hw_init::gpio_pull_up(gpio),
            PinMode::HighZ => hw_init::gpio_high_z(gpio),
        }
    }

    fn arm_interrupt(&mut self, line: Line) {
        if let Some(gpio) = pins::gpio_for(line) {
            hw_init::gpio_intr(gpio, true);
        }
    }

    fn disarm_interrupt(&mut self, line: Line) {
        if let Some(gpio) = pins::gpio_for(line) {
            hw_init::gpio_intr(gpio, false);
        }
    }
}
