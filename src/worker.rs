//! Publish worker: the one context that builds, persists and emits
//! telemetry frames.
//!
//! ```text
//!  PublishQueue ──┐
//!                 ├──▶ PublishWorker::run ──▶ snapshot → persist → emit
//!  CommandChannel ┘          │                     │
//!                            └──▶ ReplyChannel     └──▶ rearm timer + connect button
//! ```
//!
//! Because only this task ever publishes, two publishes never interleave
//! and flash is written at most once per frame.

use futures_lite::future;
use log::{info, warn};

use crate::app::ports::{Line, PinPort, PublishPort, StoragePort, TelemetrySink, TimerPort};
use crate::app::service::CounterService;
use crate::console;
use crate::rpc::channels::{CommandChannel, Inbound, PublishQueue, ReplyChannel};
use crate::rpc::codec::TelemetryFrame;
use crate::scheduler::{PublishRequest, PublishTrigger};

/// Capacity of the buffer one console command renders into.
const CONSOLE_OUT_MAX: usize = 256;

enum Wake {
    Publish(PublishRequest),
    Inbound(Inbound),
}

pub struct PublishWorker<O: TelemetrySink> {
    sink: O,
    published: u32,
}

impl<O: TelemetrySink> PublishWorker<O> {
    pub fn new(sink: O) -> Self {
        Self { sink, published: 0 }
    }

    pub fn sink(&self) -> &O {
        &self.sink
    }

    /// Frames emitted since boot.
    pub fn published(&self) -> u32 {
        self.published
    }

    /// Act on one publish request. Returns the frame if one was emitted.
    pub fn handle<S: StoragePort>(
        &mut self,
        request: PublishRequest,
        service: &mut CounterService<'_, S>,
        timer: &mut impl TimerPort,
        pins: &mut impl PinPort,
        queue: &impl PublishPort,
    ) -> Option<TelemetryFrame> {
        match request {
            PublishRequest::TimerExpired => {
                let trigger = service.on_timer_fire(timer);
                Some(self.publish(trigger, service, timer, pins))
            }
            PublishRequest::Now(trigger) => Some(self.publish(trigger, service, timer, pins)),
            PublishRequest::ConnectPressed => {
                let delay = service.settings().connect_delay();
                service.request_publish(PublishTrigger::Connect, delay, timer, queue);
                None
            }
        }
    }

    /// Snapshot, persist, emit.
    ///
    /// The persisted image is the exact snapshot that was encoded, so flash
    /// and the last frame always agree. Afterwards the periodic cadence is
    /// restored and the connect button re-armed.
    pub fn publish<S: StoragePort>(
        &mut self,
        trigger: PublishTrigger,
        service: &mut CounterService<'_, S>,
        timer: &mut impl TimerPort,
        pins: &mut impl PinPort,
    ) -> TelemetryFrame {
        let counts = service.counts();
        let frame = TelemetryFrame::new(service.module_id(), &counts);

        service.persist_or_warn(&counts);
        self.sink.emit(&frame);
        self.published = self.published.wrapping_add(1);
        info!("Worker: {:?} publish, counts {:?}", trigger, counts);

        service.rearm_after(trigger, timer);
        pins.arm_interrupt(Line::Connect);
        frame
    }

    /// Run a remote frame or console command.
    pub fn handle_inbound<S: StoragePort>(
        &mut self,
        msg: Inbound,
        service: &mut CounterService<'_, S>,
        timer: &mut impl TimerPort,
        queue: &impl PublishPort,
        replies: &ReplyChannel,
    ) {
        match msg {
            Inbound::Remote(frame) => {
                if let Some(reply) = service.handle_frame(&frame, timer, queue) {
                    if replies.try_send(reply.to_bytes()).is_err() {
                        warn!("Worker: reply channel full, reply dropped");
                    }
                }
            }
            Inbound::Console(cmd) => {
                let mut out: heapless::String<CONSOLE_OUT_MAX> = heapless::String::new();
                if let Err(e) = console::execute(cmd, service, timer, queue, &mut out) {
                    warn!("console: {}", e);
                }
                for line in out.lines() {
                    info!("{}", line);
                }
            }
        }
    }

    /// Handle every request already queued. Returns the number of frames
    /// emitted.
    pub fn drain<S: StoragePort>(
        &mut self,
        queue: &PublishQueue,
        service: &mut CounterService<'_, S>,
        timer: &mut impl TimerPort,
        pins: &mut impl PinPort,
    ) -> usize {
        let mut emitted = 0;
        while let Some(request) = queue.try_receive() {
            if self.handle(request, service, timer, pins, queue).is_some() {
                emitted += 1;
            }
        }
        emitted
    }

    /// Worker task body. Suspends only on its two inbound channels;
    /// pending publishes take precedence over commands.
    pub async fn run<S: StoragePort>(
        &mut self,
        queue: &PublishQueue,
        commands: &CommandChannel,
        replies: &ReplyChannel,
        service: &mut CounterService<'_, S>,
        timer: &mut impl TimerPort,
        pins: &mut impl PinPort,
    ) {
        info!("Worker: started");
        loop {
            let wake = future::or(
                async { Wake::Publish(queue.receive().await) },
                async { Wake::Inbound(commands.receive().await) },
            )
            .await;

            match wake {
                Wake::Publish(request) => {
                    self.handle(request, service, timer, pins, queue);
                }
                Wake::Inbound(msg) => self.handle_inbound(msg, service, timer, queue, replies),
            }
        }
    }
}
