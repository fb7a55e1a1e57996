//! Counter service, the hexagonal core.
//!
//! [`CounterService`] owns the persisted counter image, the publish
//! scheduler and the command handler. It exposes a hardware-agnostic API;
//! timers, flash and the worker queue are injected as port traits so the
//! whole service runs against mocks on the host.
//!
//! ```text
//!   command frame ──▶ ┌────────────────────────┐ ──▶ Reply
//!                     │     CounterService     │
//!    StoragePort ◀───▶│ config · scheduler     │──▶ TimerPort / PublishPort
//!                     └────────────────────────┘
//! ```
//!
//! Flash is written only on publish, reset and period change.

use embassy_time::Duration;
use log::{debug, info, warn};

use crate::config::{CounterConfig, CounterSettings, CONFIG_IMAGE_MAX, CONFIG_NAMESPACE, NUM_CHANNELS};
use crate::counter::PulseCounter;
use crate::error::Result;
use crate::rpc::command::{self, Reply};
use crate::scheduler::{PublishScheduler, PublishTrigger};

use super::commands::AppCommand;
use super::ports::{ConfigError, PublishPort, StoragePort, TimerPort};

// ───────────────────────────────────────────────────────────────
// CounterService
// ───────────────────────────────────────────────────────────────

pub struct CounterService<'a, S: StoragePort> {
    settings: CounterSettings,
    counter: &'a PulseCounter,
    scheduler: PublishScheduler,
    storage: S,
    key: heapless::String<8>,
}

impl<'a, S: StoragePort> CounterService<'a, S> {
    /// Restore state from storage and arm the first periodic publish.
    ///
    /// A missing, corrupt or out-of-range image is replaced by factory
    /// defaults, which are written back immediately. Only invalid
    /// `settings` make this fail.
    pub fn init(
        settings: CounterSettings,
        counter: &'a PulseCounter,
        storage: S,
        timer: &mut impl TimerPort,
    ) -> Result<Self> {
        settings.validate()?;
        let key = settings.storage_key();

        let loaded = Self::load(&storage, &settings, &key);
        let config = match loaded {
            Ok(cfg) => {
                info!(
                    "Counter: restored counts {:?} from storage",
                    cfg.counts
                );
                cfg
            }
            Err(e) => {
                warn!("Counter: stored config unusable ({}), using defaults", e);
                CounterConfig::defaults(&settings)
            }
        };

        counter.bank().restore(&config.counts);
        let mut service = Self {
            settings,
            counter,
            scheduler: PublishScheduler::new(&settings, config.publish_period),
            storage,
            key,
        };

        if loaded.is_err() {
            service.persist_or_warn(&config.counts);
        }

        info!("Counter: publish period {}h", service.period());
        service.scheduler.start(timer);
        Ok(service)
    }

    fn load(
        storage: &S,
        settings: &CounterSettings,
        key: &str,
    ) -> core::result::Result<CounterConfig, ConfigError> {
        let mut buf = [0u8; CONFIG_IMAGE_MAX];
        let len = storage.read(CONFIG_NAMESPACE, key, &mut buf)?;
        let config = CounterConfig::from_image(&buf[..len])?;
        config.validate(settings)?;
        Ok(config)
    }

    // ── Persistence ───────────────────────────────────────────

    /// Write `counts` and the current period as a valid image.
    pub fn persist_counts(&mut self, counts: &[u32; NUM_CHANNELS]) -> Result<()> {
        let image = CounterConfig::snapshot(*counts, self.scheduler.period());
        let mut buf = [0u8; CONFIG_IMAGE_MAX];
        let len = image.to_image(&mut buf)?;
        self.storage.write(CONFIG_NAMESPACE, &self.key, &buf[..len])?;
        debug!("Counter: persisted {} bytes", len);
        Ok(())
    }

    /// Persist the live counters.
    pub fn persist(&mut self) -> Result<()> {
        let counts = self.counts();
        self.persist_counts(&counts)
    }

    /// Persist, logging instead of failing. The in-memory state stays
    /// authoritative and the next trigger point writes it again.
    pub fn persist_or_warn(&mut self, counts: &[u32; NUM_CHANNELS]) {
        if let Err(e) = self.persist_counts(counts) {
            warn!("Counter: persist failed: {}", e);
        }
    }

    // ── Operations ────────────────────────────────────────────

    /// Change the publish period, persisting on success.
    pub fn set_period(&mut self, period: u8, timer: &mut impl TimerPort) -> Result<()> {
        self.scheduler.set_period(period, timer)?;
        let counts = self.counts();
        self.persist_or_warn(&counts);
        Ok(())
    }

    /// Zero every counter and persist.
    pub fn reset_counters(&mut self) {
        self.counter.bank().clear();
        self.persist_or_warn(&[0; NUM_CHANNELS]);
        info!("Counter: counters reset");
    }

    /// Zero every counter and restore the shortest period.
    pub fn reset_defaults(&mut self, timer: &mut impl TimerPort) {
        self.counter.bank().clear();
        if let Err(e) = self
            .scheduler
            .set_period(self.settings.period_min_hours, timer)
        {
            warn!("Counter: default period refused: {}", e);
        }
        self.persist_or_warn(&[0; NUM_CHANNELS]);
        info!("Counter: defaults restored");
    }

    /// Queue a publish after `delay`.
    pub fn request_publish(
        &mut self,
        trigger: PublishTrigger,
        delay: Duration,
        timer: &mut impl TimerPort,
        queue: &impl PublishPort,
    ) -> bool {
        self.scheduler.request_immediate(delay, trigger, timer, queue)
    }

    /// `Publish` timer expired.
    pub fn on_timer_fire(&mut self, timer: &mut impl TimerPort) -> PublishTrigger {
        self.scheduler.on_timer_fire(timer)
    }

    /// Restore the periodic cadence after a publish that was not itself
    /// periodic. Periodic fires have re-armed already.
    pub fn rearm_after(&mut self, trigger: PublishTrigger, timer: &mut impl TimerPort) {
        if trigger != PublishTrigger::Periodic {
            self.scheduler.rearm(timer);
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Execute a decoded command. `None` means no synchronous reply.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        timer: &mut impl TimerPort,
        queue: &impl PublishPort,
    ) -> Option<Reply> {
        let id = self.module_id();
        match cmd {
            AppCommand::SetPeriod(period) => match self.set_period(period, timer) {
                Ok(()) => Some(Reply::ok(id)),
                Err(_) => Some(Reply::rejected(id)),
            },
            AppCommand::Poll => {
                self.request_publish(PublishTrigger::Poll, Duration::from_ticks(0), timer, queue);
                None
            }
            AppCommand::Reset => {
                self.reset_counters();
                Some(Reply::ok(id))
            }
        }
    }

    /// Decode and execute a raw command frame. Malformed frames and
    /// unknown opcodes produce no reply and change nothing.
    pub fn handle_frame(
        &mut self,
        frame: &[u8],
        timer: &mut impl TimerPort,
        queue: &impl PublishPort,
    ) -> Option<Reply> {
        match command::decode(frame) {
            Ok(cmd) => self.handle_command(cmd, timer, queue),
            Err(e) => {
                debug!("Counter: dropping command frame: {}", e);
                None
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn counts(&self) -> [u32; NUM_CHANNELS] {
        self.counter.bank().snapshot()
    }

    pub fn period(&self) -> u8 {
        self.scheduler.period()
    }

    pub fn module_id(&self) -> u8 {
        self.settings.module_id
    }

    pub fn settings(&self) -> &CounterSettings {
        &self.settings
    }

    pub fn scheduler(&self) -> &PublishScheduler {
        &self.scheduler
    }

    pub fn counter(&self) -> &'a PulseCounter {
        self.counter
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }
}
