//! Publish worker: trigger sources, coalescing and the async task loop.

use embassy_time::Duration;
use futures_lite::future;

use pulsecounter::app::ports::{Line, TimerId};
use pulsecounter::console::ConsoleCommand;
use pulsecounter::rpc::channels::{CommandChannel, CommandFrame, Inbound, ReplyChannel};
use pulsecounter::rpc::codec;

use crate::mock_hw::{MockStorage, Rig};

fn hours(h: u64) -> Duration {
    Duration::from_secs(h * 3600)
}

fn remote(bytes: &[u8]) -> Inbound {
    Inbound::Remote(CommandFrame::from_slice(bytes).unwrap())
}

#[test]
fn periodic_fire_publishes_and_rearms() {
    let mut rig = Rig::boot(MockStorage::new());
    rig.pulse(1);

    for n in 1..=3 {
        assert!(rig.fire_publish_timer());
        assert_eq!(rig.drain(), 1);
        assert_eq!(rig.frames().len(), n);
        assert_eq!(rig.timers.pending(TimerId::Publish), Some(hours(1)));
    }
    assert_eq!(rig.last_frame().unwrap().counts(), [0, 1, 0, 0]);
    assert_eq!(rig.worker.published(), 3);
}

#[test]
fn connect_button_publishes_after_delay() {
    let mut rig = Rig::boot(MockStorage::new());
    rig.command(&[1, 4]);
    rig.pulse(3);

    assert!(rig.press_connect());
    assert!(!rig.pins.is_armed(Line::Connect));

    // The press itself only schedules the one-shot.
    assert_eq!(rig.drain(), 0);
    assert_eq!(rig.timers.pending(TimerId::Publish), Some(Duration::from_secs(1)));
    assert!(rig.frames().is_empty());

    assert!(rig.fire_publish_timer());
    assert_eq!(rig.drain(), 1);
    assert_eq!(rig.last_frame().unwrap().counts(), [0, 0, 0, 1]);

    // Periodic cadence restored, button live again.
    assert_eq!(rig.timers.pending(TimerId::Publish), Some(hours(4)));
    assert!(rig.pins.is_armed(Line::Connect));
}

#[test]
fn poll_restarts_periodic_cadence() {
    let mut rig = Rig::boot(MockStorage::new());
    let before = rig.timers.count(TimerId::Publish);
    rig.command(&[2]);
    rig.drain();
    assert_eq!(rig.timers.count(TimerId::Publish), before + 1);
    assert_eq!(rig.timers.pending(TimerId::Publish), Some(hours(1)));
}

#[test]
fn burst_of_polls_is_coalesced() {
    let mut rig = Rig::boot(MockStorage::new());
    rig.pulse(0);
    for _ in 0..5 {
        assert_eq!(rig.command(&[2]), None);
    }
    assert_eq!(rig.drain(), 4);
    assert!(
        rig.frames()
            .iter()
            .all(|f| f.counts() == [1, 0, 0, 0])
    );
}

#[test]
fn publish_persists_exactly_what_it_sends() {
    let mut rig = Rig::boot(MockStorage::new());
    rig.pulse(0);
    rig.pulse(2);
    let writes = rig.storage().writes;

    rig.command(&[2]);
    rig.drain();

    assert_eq!(rig.storage().writes, writes + 1);
    let frame = rig.last_frame().unwrap();
    let (id, counts) = codec::decode(frame.as_bytes()).unwrap();
    assert_eq!(id, 0x08);
    assert_eq!(counts, [1, 0, 1, 0]);
    assert_eq!(rig.service.counts(), [1, 0, 1, 0], "publishing does not clear counts");
}

#[test]
fn persist_failure_still_emits() {
    let mut rig = Rig::boot(MockStorage::new());
    rig.pulse(2);
    rig.service.storage_mut().fail_writes = true;

    rig.command(&[2]);
    assert_eq!(rig.drain(), 1);
    assert_eq!(rig.last_frame().unwrap().counts(), [0, 0, 1, 0]);
    assert_eq!(rig.timers.pending(TimerId::Publish), Some(hours(1)));
}

#[test]
fn wide_counts_are_truncated_on_the_wire() {
    let mut rig = Rig::boot(MockStorage::new());
    rig.counter.bank().restore(&[0x0100_0005, 0, 0, 0]);
    rig.command(&[2]);
    rig.drain();
    assert_eq!(rig.last_frame().unwrap().counts(), [5, 0, 0, 0]);
    assert_eq!(rig.service.counts()[0], 0x0100_0005);
}

#[test]
fn run_loop_serves_queue_and_commands() {
    let mut rig = Rig::boot(MockStorage::new());
    rig.pulse(0);
    rig.pulse(0);

    let commands = CommandChannel::new();
    let replies = ReplyChannel::new();
    commands.try_send(remote(&[1, 6])).unwrap();
    commands.try_send(remote(&[2])).unwrap();
    commands.try_send(remote(&[7, 7])).unwrap();
    commands.try_send(Inbound::Console(ConsoleCommand::Get)).unwrap();

    let Rig {
        queue,
        pins,
        timers,
        service,
        worker,
        ..
    } = &mut rig;

    // `run` never returns; the second arm completes once it parks on
    // empty channels.
    future::block_on(future::or(
        worker.run(*queue, &commands, &replies, service, timers, pins),
        async {},
    ));

    assert_eq!(replies.try_receive(), Ok([0x08, 0]));
    assert!(replies.try_receive().is_err(), "unknown opcode gets no reply");
    assert_eq!(rig.service.period(), 6);
    assert_eq!(rig.frames().len(), 1);
    assert_eq!(rig.last_frame().unwrap().counts(), [2, 0, 0, 0]);
    assert!(rig.queue.is_empty());
}

#[test]
fn console_commands_through_the_worker() {
    let mut rig = Rig::boot(MockStorage::new());
    let replies = ReplyChannel::new();
    rig.pulse(1);

    let Rig {
        queue,
        timers,
        service,
        worker,
        ..
    } = &mut rig;

    worker.handle_inbound(Inbound::Console(ConsoleCommand::Period(9)), service, timers, *queue, &replies);
    assert_eq!(service.period(), 9);

    worker.handle_inbound(Inbound::Console(ConsoleCommand::Period(40)), service, timers, *queue, &replies);
    assert_eq!(service.period(), 9);

    worker.handle_inbound(Inbound::Console(ConsoleCommand::Send), service, timers, *queue, &replies);
    assert_eq!(queue.len(), 1);

    worker.handle_inbound(Inbound::Console(ConsoleCommand::Reset), service, timers, *queue, &replies);
    assert_eq!(service.counts(), [0; 4]);
    assert_eq!(service.period(), 1);
    assert!(replies.try_receive().is_err(), "console output goes to the log");
}
