//! Log-based telemetry sink adapter.
//!
//! Implements [`TelemetrySink`] by writing each frame to the ESP-IDF
//! logger (UART / USB-CDC in production). A radio uplink would implement
//! the same trait.

use log::info;

use crate::app::ports::TelemetrySink;
use crate::rpc::codec::TelemetryFrame;

/// Adapter that logs every [`TelemetryFrame`] to the serial console.
#[derive(Debug, Default)]
pub struct LogTelemetrySink {
    sent: u32,
}

impl LogTelemetrySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> u32 {
        self.sent
    }
}

impl TelemetrySink for LogTelemetrySink {
    fn emit(&mut self, frame: &TelemetryFrame) {
        self.sent = self.sent.wrapping_add(1);
        info!(
            "TELEM | id=0x{:02x} | counts={:?} | raw={:02x?}",
            frame.module_id(),
            frame.counts(),
            frame.as_bytes(),
        );
    }
}
