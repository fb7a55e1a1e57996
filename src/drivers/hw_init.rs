//! One-shot GPIO bring-up plus the raw pin helpers the adapters use.
//!
//! Configures the counting inputs and the connect button as pulled-up
//! inputs with falling-edge interrupts, installs the GPIO ISR service and
//! registers one handler per line. Called once from `main()` before the
//! worker starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
    IsrHandlerFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
            Self::IsrHandlerFailed(rc) => write!(f, "GPIO ISR handler add failed (rc={})", rc),
        }
    }
}

/// C-ABI edge handler. The argument is the channel index for counting
/// inputs and null for the connect button.
pub type IsrHandler = unsafe extern "C" fn(arg: *mut core::ffi::c_void);

#[cfg(target_os = "espidf")]
pub fn init_peripherals(counter_isr: IsrHandler, button_isr: IsrHandler) -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the worker starts; single-threaded.
    unsafe {
        let mut mask = 1u64 << pins::CONNECT_BUTTON_GPIO;
        for &pin in &pins::COUNTER_GPIOS {
            mask |= 1u64 << pin;
        }
        let cfg = gpio_config_t {
            pin_bit_mask: mask,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_NEGEDGE,
        };
        let ret = gpio_config(&cfg);
        if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }

        let ret = gpio_install_isr_service(0);
        // Another component may already own the service.
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        for (i, &pin) in pins::COUNTER_GPIOS.iter().enumerate() {
            let ret = gpio_isr_handler_add(pin, Some(counter_isr), i as *mut core::ffi::c_void);
            if ret != ESP_OK as i32 { return Err(HwInitError::IsrHandlerFailed(ret)); }
        }
        let ret = gpio_isr_handler_add(
            pins::CONNECT_BUTTON_GPIO,
            Some(button_isr),
            core::ptr::null_mut(),
        );
        if ret != ESP_OK as i32 { return Err(HwInitError::IsrHandlerFailed(ret)); }
    }
    info!("hw_init: {} counter inputs + connect button armed", pins::COUNTER_GPIOS.len());
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals(_counter_isr: IsrHandler, _button_isr: IsrHandler) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── Pin helpers ───────────────────────────────────────────────
//
// All of these are single register writes and safe from ISR context.

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: read-only register access on a configured input.
    (unsafe { gpio_get_level(pin) }) != 0
}

#[cfg(target_os = "espidf")]
pub fn gpio_pull_up(pin: i32) {
    // SAFETY: pin was configured by init_peripherals().
    unsafe {
        gpio_set_direction(pin, gpio_mode_t_GPIO_MODE_INPUT);
        gpio_set_pull_mode(pin, gpio_pull_mode_t_GPIO_PULLUP_ONLY);
    }
}

#[cfg(target_os = "espidf")]
pub fn gpio_high_z(pin: i32) {
    // SAFETY: as above; disabling input and pull leaves the pad floating.
    unsafe {
        gpio_set_pull_mode(pin, gpio_pull_mode_t_GPIO_FLOATING);
        gpio_set_direction(pin, gpio_mode_t_GPIO_MODE_DISABLE);
    }
}

#[cfg(target_os = "espidf")]
pub fn gpio_intr(pin: i32, enable: bool) {
    // SAFETY: the ISR service is installed before any caller runs.
    unsafe {
        if enable {
            gpio_intr_enable(pin);
        } else {
            gpio_intr_disable(pin);
        }
    }
}

// Simulation: inputs idle high, configuration is a no-op.

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: i32) -> bool {
    true
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_pull_up(_pin: i32) {}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_high_z(_pin: i32) {}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_intr(_pin: i32, _enable: bool) {}
