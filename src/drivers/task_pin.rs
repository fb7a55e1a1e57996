//! Worker thread placement.
//!
//! On ESP-IDF a `std::thread` is a pthread over a FreeRTOS task. Its core,
//! priority and stack come from `esp_pthread_set_cfg()`, which only applies
//! to the next pthread the calling thread creates, so configure and spawn
//! back to back. Host builds get a plain named thread.
//!
//! Spawn failure is returned: a module without its worker stays idle while
//! the rest of the firmware keeps running.

use core::ffi::CStr;
use std::io;
use std::thread::JoinHandle;

/// CPU core identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// PRO_CPU, where the radio stacks live.
    Pro = 0,
    /// APP_CPU.
    App = 1,
}

/// Where and how a long-lived task runs.
#[derive(Debug, Clone, Copy)]
pub struct TaskSpec {
    pub name: &'static CStr,
    pub core: Core,
    pub priority: u8,
    pub stack_bytes: usize,
}

impl TaskSpec {
    /// Thread name without the NUL.
    pub fn label(&self) -> &'static str {
        self.name.to_str().unwrap_or("task")
    }

    /// Start `f` on a thread placed as described.
    pub fn spawn(&self, f: impl FnOnce() + Send + 'static) -> io::Result<JoinHandle<()>> {
        self.place()?;
        log::info!(
            "Spawning '{}' on {:?} (pri={}, stack={}B)",
            self.label(),
            self.core,
            self.priority,
            self.stack_bytes
        );
        std::thread::Builder::new()
            .name(self.label().into())
            .stack_size(self.stack_bytes)
            .spawn(f)
    }

    #[cfg(target_os = "espidf")]
    fn place(&self) -> io::Result<()> {
        use esp_idf_svc::sys::{ESP_OK, esp_create_default_pthread_config, esp_pthread_set_cfg};

        // SAFETY: the config is plain data and `name` is 'static, so the
        // pointer stays valid after the call.
        let rc = unsafe {
            let mut cfg = esp_create_default_pthread_config();
            cfg.pin_to_core = self.core as i32;
            cfg.prio = i32::from(self.priority);
            cfg.stack_size = self.stack_bytes as i32;
            cfg.thread_name = self.name.as_ptr();
            esp_pthread_set_cfg(&cfg)
        };
        if rc == ESP_OK as i32 {
            Ok(())
        } else {
            Err(io::Error::other(format!("esp_pthread_set_cfg rc={rc}")))
        }
    }

    // Host threads ignore core and priority.
    #[cfg(not(target_os = "espidf"))]
    fn place(&self) -> io::Result<()> {
        Ok(())
    }
}
