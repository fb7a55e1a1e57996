//! Publish scheduler.
//!
//! Owns the publish period and the single `Publish` one-shot timer. The
//! timer callback never touches this state: it posts
//! [`PublishRequest::TimerExpired`] and the worker calls
//! [`PublishScheduler::on_timer_fire`], so everything here runs in one
//! context.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Trigger Sources                          │
//! │                                                              │
//! │  ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌──────────┐   │
//! │  │ Periodic  │  │  Connect  │  │   POLL    │  │ Console  │   │
//! │  │  timer    │  │  button   │  │  command  │  │  "send"  │   │
//! │  └─────┬─────┘  └─────┬─────┘  └─────┬─────┘  └─────┬────┘   │
//! │        │              │ 1 s one-shot │ delay 0      │        │
//! │        ▼              ▼              ▼              ▼        │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │               PublishQueue (depth 4)                   │  │
//! │  └───────────────────────┬────────────────────────────────┘  │
//! │                          ▼                                   │
//! │                    PublishWorker                             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The periodic chain is self-perpetuating: every periodic fire re-arms the
//! timer while the period is non-zero. Zeroing the period does not cancel
//! a fire that is already scheduled; the chain simply stops after it.

use log::{debug, info, warn};

use crate::app::ports::{PublishPort, TimerId, TimerPort};
use crate::config::CounterSettings;
use crate::error::{Error, Result};
use embassy_time::Duration;

// ═══════════════════════════════════════════════════════════════
//  Requests
// ═══════════════════════════════════════════════════════════════

/// What caused a publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishTrigger {
    /// Periodic timer.
    Periodic,
    /// Delayed publish after a connect-button press.
    Connect,
    /// Remote POLL command.
    Poll,
    /// Console `send`.
    Console,
}

/// Message posted to the worker queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishRequest {
    /// The `Publish` timer expired.
    TimerExpired,
    /// Publish right away.
    Now(PublishTrigger),
    /// Connect button went low; the worker schedules the delayed publish.
    ConnectPressed,
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler
// ═══════════════════════════════════════════════════════════════

pub struct PublishScheduler {
    settings: CounterSettings,
    /// Hours between periodic publishes; 0 stops the chain.
    period: u8,
    /// What the pending `Publish` timer expiry stands for.
    armed: Option<PublishTrigger>,
}

impl PublishScheduler {
    pub fn new(settings: &CounterSettings, period: u8) -> Self {
        Self {
            settings: *settings,
            period,
            armed: None,
        }
    }

    pub fn period(&self) -> u8 {
        self.period
    }

    /// Trigger the pending timer expiry will produce, if any.
    pub fn armed(&self) -> Option<PublishTrigger> {
        self.armed
    }

    /// Arm the first periodic publish.
    pub fn start(&mut self, timer: &mut impl TimerPort) {
        self.rearm(timer);
    }

    /// Change the publish period and restart the cadence from now.
    ///
    /// `0` and anything above the configured maximum are rejected and the
    /// previous period is kept.
    pub fn set_period(&mut self, period: u8, timer: &mut impl TimerPort) -> Result<()> {
        if !self.settings.period_in_range(period) {
            warn!(
                "Scheduler: rejected period {} (allowed {}..={})",
                period, self.settings.period_min_hours, self.settings.period_max_hours
            );
            return Err(Error::InvalidPeriod(period));
        }
        self.period = period;
        info!("Scheduler: publish period {}h", period);
        self.rearm(timer);
        Ok(())
    }

    /// Stop the periodic chain after the fire already scheduled, if any.
    pub fn disable(&mut self) {
        self.period = 0;
    }

    /// Ask for a publish after `delay`.
    ///
    /// A zero delay posts straight to the worker queue. Anything longer
    /// takes over the `Publish` timer as a one-shot; the worker restores
    /// the periodic cadence after that publish. Returns `false` if the
    /// request was coalesced into one already queued.
    pub fn request_immediate(
        &mut self,
        delay: Duration,
        trigger: PublishTrigger,
        timer: &mut impl TimerPort,
        queue: &impl PublishPort,
    ) -> bool {
        if delay == Duration::from_ticks(0) {
            let queued = queue.post(PublishRequest::Now(trigger));
            if !queued {
                debug!("Scheduler: {:?} publish coalesced, queue full", trigger);
            }
            return queued;
        }
        debug!("Scheduler: {:?} publish in {}ms", trigger, delay.as_millis());
        timer.schedule_once(TimerId::Publish, delay);
        self.armed = Some(trigger);
        true
    }

    /// `Publish` timer expired. Returns the trigger it was armed for.
    ///
    /// A periodic expiry re-arms the next period here; other triggers are
    /// re-armed by the worker after it publishes.
    pub fn on_timer_fire(&mut self, timer: &mut impl TimerPort) -> PublishTrigger {
        let trigger = self.armed.take().unwrap_or(PublishTrigger::Periodic);
        if trigger == PublishTrigger::Periodic {
            self.rearm(timer);
        }
        trigger
    }

    /// Schedule the next periodic publish, if the period is non-zero.
    pub fn rearm(&mut self, timer: &mut impl TimerPort) {
        if self.period == 0 {
            return;
        }
        timer.schedule_once(TimerId::Publish, self.settings.period_duration(self.period));
        self.armed = Some(PublishTrigger::Periodic);
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
