//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements     | Connects to              |
//! |------------|----------------|--------------------------|
//! | `gpio`     | PinPort        | ESP32 GPIO registers     |
//! | `timer`    | TimerPort      | esp_timer one-shots      |
//! | `nvs`      | StoragePort    | NVS / in-memory store    |
//! | `log_sink` | TelemetrySink  | Serial log output        |

pub mod gpio;
pub mod log_sink;
pub mod nvs;
pub mod timer;
