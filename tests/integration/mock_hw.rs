//! Mock hardware for integration tests.
//!
//! Pins, timers and flash record every call so tests can assert on the
//! full history without touching real registers. [`Rig`] wires them to a
//! booted counter the way `main.rs` wires the real adapters.

use std::collections::HashMap;

use embassy_time::Duration;
use embedded_hal::digital::PinState;

use pulsecounter::app::ports::{
    Line, PinMode, PinPort, PublishPort, StorageError, StoragePort, TelemetrySink, TimerId,
    TimerPort,
};
use pulsecounter::app::service::CounterService;
use pulsecounter::config::{CounterSettings, CONFIG_NAMESPACE, NUM_CHANNELS};
use pulsecounter::counter::PulseCounter;
use pulsecounter::rpc::channels::PublishQueue;
use pulsecounter::rpc::codec::TelemetryFrame;
use pulsecounter::scheduler::PublishRequest;
use pulsecounter::worker::PublishWorker;

/// Storage key of the default module (id 0x08).
pub const KEY: &str = "m08";

// ── MockPins ──────────────────────────────────────────────────

pub struct MockPins {
    levels: HashMap<Line, bool>,
    pub modes: HashMap<Line, PinMode>,
    pub armed: HashMap<Line, bool>,
}

#[allow(dead_code)]
impl MockPins {
    /// Every line idle (high, released).
    pub fn idle() -> Self {
        let mut levels = HashMap::new();
        for i in 0..NUM_CHANNELS {
            levels.insert(Line::Counter(i), true);
        }
        levels.insert(Line::Connect, true);
        Self {
            levels,
            modes: HashMap::new(),
            armed: HashMap::new(),
        }
    }

    pub fn set_level(&mut self, line: Line, high: bool) {
        self.levels.insert(line, high);
    }

    pub fn is_armed(&self, line: Line) -> bool {
        self.armed.get(&line).copied().unwrap_or(false)
    }

    pub fn mode(&self, line: Line) -> Option<PinMode> {
        self.modes.get(&line).copied()
    }
}

impl PinPort for MockPins {
    fn read(&mut self, line: Line) -> PinState {
        assert_eq!(
            self.mode(line),
            Some(PinMode::InputPullUp),
            "{:?} sampled without pull-up",
            line
        );
        PinState::from(self.levels.get(&line).copied().unwrap_or(true))
    }

    fn set_mode(&mut self, line: Line, mode: PinMode) {
        self.modes.insert(line, mode);
    }

    fn arm_interrupt(&mut self, line: Line) {
        self.armed.insert(line, true);
    }

    fn disarm_interrupt(&mut self, line: Line) {
        self.armed.insert(line, false);
    }
}

// ── MockTimers ────────────────────────────────────────────────

#[derive(Default)]
pub struct MockTimers {
    pub scheduled: HashMap<TimerId, Duration>,
    pub history: Vec<(TimerId, Duration)>,
}

#[allow(dead_code)]
impl MockTimers {
    /// Expire `id` if armed, returning the delay it was armed with.
    pub fn take(&mut self, id: TimerId) -> Option<Duration> {
        self.scheduled.remove(&id)
    }

    pub fn pending(&self, id: TimerId) -> Option<Duration> {
        self.scheduled.get(&id).copied()
    }

    pub fn count(&self, id: TimerId) -> usize {
        self.history.iter().filter(|(t, _)| *t == id).count()
    }
}

impl TimerPort for MockTimers {
    fn schedule_once(&mut self, timer: TimerId, delay: Duration) {
        self.scheduled.insert(timer, delay);
        self.history.push((timer, delay));
    }

    fn cancel(&mut self, timer: TimerId) {
        self.scheduled.remove(&timer);
    }

    fn is_scheduled(&self, timer: TimerId) -> bool {
        self.scheduled.contains_key(&timer)
    }
}

// ── MockStorage ───────────────────────────────────────────────

#[derive(Default)]
pub struct MockStorage {
    blobs: HashMap<String, Vec<u8>>,
    pub writes: usize,
    pub fail_writes: bool,
}

#[allow(dead_code)]
impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-loaded with a raw image for the default module.
    pub fn with_blob(data: &[u8]) -> Self {
        let mut storage = Self::new();
        storage
            .blobs
            .insert(format!("{CONFIG_NAMESPACE}::{KEY}"), data.to_vec());
        storage
    }

    pub fn blob(&self) -> Option<&[u8]> {
        self.blobs
            .get(&format!("{CONFIG_NAMESPACE}::{KEY}"))
            .map(Vec::as_slice)
    }
}

impl StoragePort for MockStorage {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let data = self
            .blobs
            .get(&format!("{namespace}::{key}"))
            .ok_or(StorageError::NotFound)?;
        let len = data.len().min(buf.len());
        buf[..len].copy_from_slice(&data[..len]);
        Ok(len)
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::IoError);
        }
        self.blobs.insert(format!("{namespace}::{key}"), data.to_vec());
        self.writes += 1;
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub frames: Vec<TelemetryFrame>,
}

impl TelemetrySink for RecordingSink {
    fn emit(&mut self, frame: &TelemetryFrame) {
        self.frames.push(*frame);
    }
}

// ── Rig ───────────────────────────────────────────────────────

/// A booted counter module on mock hardware.
pub struct Rig {
    pub counter: &'static PulseCounter,
    pub queue: &'static PublishQueue,
    pub pins: MockPins,
    pub timers: MockTimers,
    pub service: CounterService<'static, MockStorage>,
    pub worker: PublishWorker<RecordingSink>,
}

#[allow(dead_code)]
impl Rig {
    pub fn boot(storage: MockStorage) -> Self {
        Self::boot_with(CounterSettings::default(), storage)
    }

    pub fn boot_with(settings: CounterSettings, storage: MockStorage) -> Self {
        // Leaked to mirror the firmware's statics; one per test is fine.
        let counter: &'static PulseCounter =
            Box::leak(Box::new(PulseCounter::new(settings.poll_interval())));
        let queue: &'static PublishQueue = Box::leak(Box::new(PublishQueue::new()));
        let mut pins = MockPins::idle();
        let mut timers = MockTimers::default();

        let service = CounterService::init(settings, counter, storage, &mut timers)
            .expect("settings are valid");
        counter.start(&mut pins);
        pins.arm_interrupt(Line::Connect);

        Self {
            counter,
            queue,
            pins,
            timers,
            service,
            worker: PublishWorker::new(RecordingSink::default()),
        }
    }

    /// Raw falling edge, as the ISR would deliver it.
    pub fn edge(&mut self, channel: usize) -> bool {
        self.counter
            .on_edge(channel, &mut self.pins, &mut self.timers)
    }

    /// Run debounce polls until the shared poll timer stops.
    /// Returns the number of polls taken.
    pub fn settle(&mut self) -> usize {
        let mut polls = 0;
        while self.timers.take(TimerId::DebouncePoll).is_some() {
            self.counter.on_poll(&mut self.pins, &mut self.timers);
            polls += 1;
            assert!(polls < 100, "debounce never settled");
        }
        polls
    }

    /// One clean press-and-release on `channel`.
    pub fn pulse(&mut self, channel: usize) {
        self.pins.set_level(Line::Counter(channel), false);
        self.edge(channel);
        self.pins.set_level(Line::Counter(channel), true);
        self.settle();
    }

    /// Deliver a remote command frame; returns the reply bytes, if any.
    pub fn command(&mut self, frame: &[u8]) -> Option<[u8; 2]> {
        self.service
            .handle_frame(frame, &mut self.timers, self.queue)
            .map(|r| r.to_bytes())
    }

    /// Expire the publish timer the way its callback does.
    pub fn fire_publish_timer(&mut self) -> bool {
        if self.timers.take(TimerId::Publish).is_some() {
            self.queue.post(PublishRequest::TimerExpired);
            true
        } else {
            false
        }
    }

    /// Connect button ISR.
    pub fn press_connect(&mut self) -> bool {
        self.pins.disarm_interrupt(Line::Connect);
        self.queue.post(PublishRequest::ConnectPressed)
    }

    /// Let the worker process everything queued. Returns frames emitted.
    pub fn drain(&mut self) -> usize {
        self.worker
            .drain(self.queue, &mut self.service, &mut self.timers, &mut self.pins)
    }

    pub fn frames(&self) -> &[TelemetryFrame] {
        &self.worker.sink().frames
    }

    pub fn last_frame(&self) -> Option<&TelemetryFrame> {
        self.frames().last()
    }

    pub fn storage(&self) -> &MockStorage {
        self.service.storage()
    }
}
