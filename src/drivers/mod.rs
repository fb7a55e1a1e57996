//! GPIO/timer bring-up and peripheral helpers.

pub mod hw_init;
pub mod hw_timer;
pub mod task_pin;
