//! Counter configuration parameters
//!
//! Two layers:
//! - [`CounterSettings`]: build-time tunables (module id, period range,
//!   debounce poll interval). Never persisted.
//! - [`CounterConfig`]: the persisted image (validity marker, per-channel
//!   counts, publish period). Written only at publish, reset and
//!   period-change, never per edge, to bound flash wear.

use core::fmt::Write as _;

use embassy_time::Duration;
use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Number of physical counting inputs.
pub const NUM_CHANNELS: usize = 4;

/// Module identifier prefixed to every telemetry frame and reply, and used
/// to key the persisted image.
pub const DEFAULT_MODULE_ID: u8 = 0x08;

/// Shortest publish period (hours).
pub const DEFAULT_PERIOD_MIN_HOURS: u8 = 1;
/// Longest publish period (hours).
pub const DEFAULT_PERIOD_MAX_HOURS: u8 = 24;

/// Interval of the shared debounce poll timer.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Seconds per publish-period unit.
pub const DEFAULT_PERIOD_UNIT_SECS: u64 = 3600;

/// Delay between a connect-button press and the resulting publish.
pub const DEFAULT_CONNECT_DELAY_SECS: u64 = 1;

/// Storage namespace for the persisted image.
pub const CONFIG_NAMESPACE: &str = "counter";

/// Upper bound of a postcard-encoded [`CounterConfig`]
/// (1 + 4 × 5-byte varints + 1).
pub const CONFIG_IMAGE_MAX: usize = 32;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Static tunables for one counter module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSettings {
    pub module_id: u8,
    /// Inclusive publish-period range (hours).
    pub period_min_hours: u8,
    pub period_max_hours: u8,
    /// Debounce poll interval while any channel is settling.
    pub poll_interval_ms: u64,
    /// Length of one publish-period unit.
    pub period_unit_secs: u64,
    /// One-shot delay applied to a connect-button publish.
    pub connect_delay_secs: u64,
}

impl Default for CounterSettings {
    fn default() -> Self {
        Self {
            module_id: DEFAULT_MODULE_ID,
            period_min_hours: DEFAULT_PERIOD_MIN_HOURS,
            period_max_hours: DEFAULT_PERIOD_MAX_HOURS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            period_unit_secs: DEFAULT_PERIOD_UNIT_SECS,
            connect_delay_secs: DEFAULT_CONNECT_DELAY_SECS,
        }
    }
}

impl CounterSettings {
    /// Reject settings that would make the scheduler or debouncer misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period_min_hours == 0 {
            return Err(ConfigError::ValidationFailed(
                "period_min_hours must be >= 1",
            ));
        }
        if self.period_max_hours < self.period_min_hours {
            return Err(ConfigError::ValidationFailed(
                "period_max_hours must be >= period_min_hours",
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "poll_interval_ms must be > 0",
            ));
        }
        if self.period_unit_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "period_unit_secs must be > 0",
            ));
        }
        Ok(())
    }

    /// Whether `hours` is an acceptable publish period.
    pub fn period_in_range(&self, hours: u8) -> bool {
        (self.period_min_hours..=self.period_max_hours).contains(&hours)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Wall time covered by `hours` period units.
    pub fn period_duration(&self, hours: u8) -> Duration {
        Duration::from_secs(self.period_unit_secs * u64::from(hours))
    }

    pub fn connect_delay(&self) -> Duration {
        Duration::from_secs(self.connect_delay_secs)
    }

    /// Storage key for this module's persisted image, e.g. `"m08"`.
    pub fn storage_key(&self) -> heapless::String<8> {
        let mut key = heapless::String::new();
        let _ = write!(key, "m{:02x}", self.module_id);
        key
    }
}

// ---------------------------------------------------------------------------
// Persisted image
// ---------------------------------------------------------------------------

/// Persisted aggregate state.
///
/// `valid` is serialized first so an erased flash page (`0xFF`) or a zeroed
/// one is recognisable from the first byte alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterConfig {
    pub valid: u8,
    /// Per-channel counts since the last reset.
    pub counts: [u32; NUM_CHANNELS],
    /// Publish period in hours.
    pub publish_period: u8,
}

impl CounterConfig {
    /// Marker written on every persist.
    pub const VALID: u8 = 1;
    /// Erased-flash sentinel.
    pub const ERASED: u8 = 0xFF;

    /// Factory state: zero counts, shortest period, not yet marked valid.
    pub fn defaults(settings: &CounterSettings) -> Self {
        Self {
            valid: 0,
            counts: [0; NUM_CHANNELS],
            publish_period: settings.period_min_hours,
        }
    }

    /// Image ready to be written: marked valid.
    pub fn snapshot(counts: [u32; NUM_CHANNELS], publish_period: u8) -> Self {
        Self {
            valid: Self::VALID,
            counts,
            publish_period,
        }
    }

    /// Check a loaded image before trusting it.
    pub fn validate(&self, settings: &CounterSettings) -> Result<(), ConfigError> {
        if self.valid == 0 || self.valid == Self::ERASED {
            return Err(ConfigError::Invalid);
        }
        if !settings.period_in_range(self.publish_period) {
            return Err(ConfigError::ValidationFailed(
                "stored publish_period out of range",
            ));
        }
        Ok(())
    }

    /// Encode into `buf`, returning the number of bytes used.
    pub fn to_image(&self, buf: &mut [u8]) -> Result<usize, ConfigError> {
        postcard::to_slice(self, buf)
            .map(|used| used.len())
            .map_err(|_| ConfigError::IoError)
    }

    /// Decode a stored image. Trailing bytes are ignored.
    pub fn from_image(bytes: &[u8]) -> Result<Self, ConfigError> {
        postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)
    }
}
