//! Pulse-counter firmware entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  EspPins      EspTimers      NvsAdapter      LogTelemetrySink  │
//! │  (PinPort)    (TimerPort)    (StoragePort)   (TelemetrySink)   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  edge ISR ──▶ PulseCounter (static) ◀── debounce timer         │
//! │  button ISR / publish timer ──▶ PublishQueue (static)          │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  worker thread: PublishWorker + CounterService         │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  main thread: serial console ──▶ CommandChannel (static)       │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::io::BufRead;

use anyhow::Result;
use embassy_time::Duration;
use log::{error, info, warn};

use pulsecounter::adapters::gpio::EspPins;
use pulsecounter::adapters::log_sink::LogTelemetrySink;
use pulsecounter::adapters::nvs::NvsAdapter;
use pulsecounter::adapters::timer::EspTimers;
use pulsecounter::app::ports::{Line, PinPort, PublishPort};
use pulsecounter::app::service::CounterService;
use pulsecounter::config::{CounterSettings, DEFAULT_POLL_INTERVAL_MS};
use pulsecounter::console;
use pulsecounter::counter::PulseCounter;
use pulsecounter::drivers::task_pin::{Core, TaskSpec};
use pulsecounter::drivers::{hw_init, hw_timer};
use pulsecounter::rpc::channels::{CommandChannel, Inbound, PublishQueue, ReplyChannel};
use pulsecounter::scheduler::PublishRequest;
use pulsecounter::worker::PublishWorker;

// ── Shared state ──────────────────────────────────────────────
//
// ISR and esp_timer callbacks cannot capture, so everything they touch
// lives here.

static COUNTER: PulseCounter =
    PulseCounter::new(Duration::from_millis(DEFAULT_POLL_INTERVAL_MS));
static PUBLISH_QUEUE: PublishQueue = PublishQueue::new();
static COMMANDS: CommandChannel = CommandChannel::new();
static REPLIES: ReplyChannel = ReplyChannel::new();

const WORKER_TASK: TaskSpec = TaskSpec {
    name: c"counter",
    core: Core::App,
    priority: 5,
    stack_bytes: 8 * 1024,
};

// ── Interrupt and timer callbacks ─────────────────────────────

/// Falling edge on a counting input; `arg` is the channel index.
unsafe extern "C" fn counter_isr(arg: *mut core::ffi::c_void) {
    COUNTER.on_edge(arg as usize, &mut EspPins, &mut EspTimers);
}

/// Connect button pressed. Stays disarmed until the next publish.
unsafe extern "C" fn connect_isr(_arg: *mut core::ffi::c_void) {
    EspPins.disarm_interrupt(Line::Connect);
    PUBLISH_QUEUE.post(PublishRequest::ConnectPressed);
}

unsafe extern "C" fn debounce_poll_cb(_arg: *mut core::ffi::c_void) {
    COUNTER.on_poll(&mut EspPins, &mut EspTimers);
}

unsafe extern "C" fn publish_timer_cb(_arg: *mut core::ffi::c_void) {
    PUBLISH_QUEUE.post(PublishRequest::TimerExpired);
}

// ── Worker ────────────────────────────────────────────────────

fn run_worker(mut service: CounterService<'static, NvsAdapter>) {
    let mut worker = PublishWorker::new(LogTelemetrySink::new());
    let executor: edge_executor::LocalExecutor<'_, 4> = edge_executor::LocalExecutor::new();

    futures_lite::future::block_on(executor.run(worker.run(
        &PUBLISH_QUEUE,
        &COMMANDS,
        &REPLIES,
        &mut service,
        &mut EspTimers,
        &mut EspPins,
    )));
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  pulse-counter v{}                ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // Any failure below leaves this module idle without taking the rest
    // of the device down.

    // ── 2. Timers, storage, restored state ────────────────────
    if let Err(rc) = hw_timer::create_timers(debounce_poll_cb, publish_timer_cb) {
        error!("Counter: timer create failed (rc={}), counting disabled", rc);
        return Ok(());
    }

    let storage = match NvsAdapter::new() {
        Ok(nvs) => nvs,
        Err(e) => {
            error!("Counter: NVS init failed ({}), counting disabled", e);
            return Ok(());
        }
    };

    let service = match CounterService::init(
        CounterSettings::default(),
        &COUNTER,
        storage,
        &mut EspTimers,
    ) {
        Ok(s) => s,
        Err(e) => {
            error!("Counter: init failed ({}), counting disabled", e);
            return Ok(());
        }
    };

    // ── 3. Worker ─────────────────────────────────────────────
    if let Err(e) = WORKER_TASK.spawn(move || run_worker(service)) {
        error!("Counter: unable to start worker ({}), counting disabled", e);
        return Ok(());
    }

    // ── 4. Inputs live ────────────────────────────────────────
    if let Err(e) = hw_init::init_peripherals(counter_isr, connect_isr) {
        error!("Counter: {}, counting disabled", e);
        return Ok(());
    }
    COUNTER.start(&mut EspPins);
    EspPins.arm_interrupt(Line::Connect);
    info!("Counter: type '{}' for commands list", console::ROOT);

    // ── 5. Serial console ─────────────────────────────────────
    for line in std::io::stdin().lock().lines() {
        let Ok(line) = line else { continue };
        if line.trim().is_empty() {
            continue;
        }
        match console::parse(&line) {
            Ok(cmd) => {
                if COMMANDS.try_send(Inbound::Console(cmd)).is_err() {
                    warn!("console: busy, command dropped");
                }
            }
            Err(e) => warn!("console: {}", e),
        }
        while let Ok(reply) = REPLIES.try_receive() {
            info!("reply: {:02x?}", reply);
        }
    }

    // stdin closed: the worker keeps running on its own thread.
    loop {
        std::thread::sleep(std::time::Duration::from_secs(60));
    }
}
