//! Timer adapter: [`TimerPort`] over esp_timer.
//!
//! Zero-sized like [`EspPins`](super::gpio::EspPins); the timer handles
//! live in the driver's statics.

use embassy_time::Duration;

use crate::app::ports::{TimerId, TimerPort};
use crate::drivers::hw_timer;

#[derive(Debug, Clone, Copy, Default)]
pub struct EspTimers;

impl TimerPort for EspTimers {
    fn schedule_once(&mut self, timer: TimerId, delay: Duration) {
        hw_timer::start_once(timer, delay.as_micros());
    }

    fn cancel(&mut self, timer: TimerId) {
        hw_timer::stop(timer);
    }

    fn is_scheduled(&self, timer: TimerId) -> bool {
        hw_timer::is_active(timer)
    }
}
