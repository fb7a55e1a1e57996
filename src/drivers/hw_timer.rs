//! One-shot timers on ESP-IDF's esp_timer API.
//!
//! Two timers exist: the shared debounce poll and the publish timer.
//! Callbacks run in the esp_timer task context (not ISR), never
//! concurrently with each other.
//!
//! On simulation targets no callback ever fires; only the armed flags are
//! tracked so the adapters behave consistently on the host.

use crate::app::ports::TimerId;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

/// C-ABI expiry callback.
pub type TimerCallback = unsafe extern "C" fn(arg: *mut core::ffi::c_void);

#[cfg(target_os = "espidf")]
static mut POLL_TIMER: esp_timer_handle_t = core::ptr::null_mut();
#[cfg(target_os = "espidf")]
static mut PUBLISH_TIMER: esp_timer_handle_t = core::ptr::null_mut();

/// SAFETY: both handles are written once in `create_timers()` before any
/// caller can reach this; afterwards they are only read.
#[cfg(target_os = "espidf")]
unsafe fn handle(id: TimerId) -> esp_timer_handle_t {
    unsafe {
        match id {
            TimerId::DebouncePoll => POLL_TIMER,
            TimerId::Publish => PUBLISH_TIMER,
        }
    }
}

/// Create both timers. Nothing is started.
#[cfg(target_os = "espidf")]
pub fn create_timers(poll_cb: TimerCallback, publish_cb: TimerCallback) -> Result<(), i32> {
    // SAFETY: POLL_TIMER and PUBLISH_TIMER are written here once at boot
    // from the single main-task context before any timer can be started.
    unsafe {
        let poll_args = esp_timer_create_args_t {
            callback: Some(poll_cb),
            arg: core::ptr::null_mut(),
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: b"debounce\0".as_ptr() as *const _,
            skip_unhandled_events: false,
        };
        let ret = esp_timer_create(&poll_args, &raw mut POLL_TIMER);
        if ret != ESP_OK as i32 {
            return Err(ret);
        }

        let publish_args = esp_timer_create_args_t {
            callback: Some(publish_cb),
            arg: core::ptr::null_mut(),
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: b"publish\0".as_ptr() as *const _,
            skip_unhandled_events: false,
        };
        let ret = esp_timer_create(&publish_args, &raw mut PUBLISH_TIMER);
        if ret != ESP_OK as i32 {
            return Err(ret);
        }
    }
    info!("hw_timer: debounce + publish timers created");
    Ok(())
}

/// (Re)start `id` as a one-shot after `micros`.
#[cfg(target_os = "espidf")]
pub fn start_once(id: TimerId, micros: u64) {
    // SAFETY: handle() contract; stop on an idle timer is harmless.
    unsafe {
        let h = handle(id);
        if h.is_null() {
            return;
        }
        esp_timer_stop(h);
        esp_timer_start_once(h, micros);
    }
}

#[cfg(target_os = "espidf")]
pub fn stop(id: TimerId) {
    // SAFETY: handle() contract.
    unsafe {
        let h = handle(id);
        if !h.is_null() {
            esp_timer_stop(h);
        }
    }
}

#[cfg(target_os = "espidf")]
pub fn is_active(id: TimerId) -> bool {
    // SAFETY: handle() contract.
    unsafe {
        let h = handle(id);
        !h.is_null() && esp_timer_is_active(h)
    }
}

// ── Simulation ───────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod sim {
    use core::sync::atomic::{AtomicBool, Ordering};

    use super::TimerId;

    static POLL_ARMED: AtomicBool = AtomicBool::new(false);
    static PUBLISH_ARMED: AtomicBool = AtomicBool::new(false);

    pub(super) fn flag(id: TimerId) -> &'static AtomicBool {
        match id {
            TimerId::DebouncePoll => &POLL_ARMED,
            TimerId::Publish => &PUBLISH_ARMED,
        }
    }

    pub(super) fn set(id: TimerId, armed: bool) {
        flag(id).store(armed, Ordering::Relaxed);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn create_timers(_poll_cb: TimerCallback, _publish_cb: TimerCallback) -> Result<(), i32> {
    log::info!("hw_timer(sim): timers tracked, callbacks never fire");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn start_once(id: TimerId, _micros: u64) {
    sim::set(id, true);
}

#[cfg(not(target_os = "espidf"))]
pub fn stop(id: TimerId) {
    sim::set(id, false);
}

#[cfg(not(target_os = "espidf"))]
pub fn is_active(id: TimerId) -> bool {
    sim::flag(id).load(core::sync::atomic::Ordering::Relaxed)
}
