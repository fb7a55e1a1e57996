//! Edge counting through the shared `PulseCounter`.

use pulsecounter::app::ports::{Line, PinMode, TimerId};
use pulsecounter::counter::debounce::ChannelState;

use crate::mock_hw::{MockStorage, Rig};

#[test]
fn clean_pulses_count_once_each() {
    let mut rig = Rig::boot(MockStorage::new());
    rig.pulse(0);
    rig.pulse(0);
    rig.pulse(0);
    rig.pulse(1);
    assert_eq!(rig.service.counts(), [3, 1, 0, 0]);
    assert!(!rig.counter.any_settling());
}

#[test]
fn bounce_burst_counts_once() {
    let mut rig = Rig::boot(MockStorage::new());
    rig.pins.set_level(Line::Counter(2), false);
    assert!(rig.edge(2));
    // Contact chatter while the interrupt is off.
    for _ in 0..20 {
        assert!(!rig.edge(2));
    }
    rig.pins.set_level(Line::Counter(2), true);
    rig.settle();
    assert_eq!(rig.service.counts(), [0, 0, 1, 0]);
}

#[test]
fn settling_pin_is_parked_and_disarmed() {
    let mut rig = Rig::boot(MockStorage::new());
    rig.pins.set_level(Line::Counter(3), false);
    rig.edge(3);
    assert_eq!(rig.pins.mode(Line::Counter(3)), Some(PinMode::HighZ));
    assert!(!rig.pins.is_armed(Line::Counter(3)));
    assert_eq!(
        rig.timers.pending(TimerId::DebouncePoll),
        Some(rig.service.settings().poll_interval())
    );
}

#[test]
fn held_input_keeps_polling_until_released() {
    let mut rig = Rig::boot(MockStorage::new());
    rig.pins.set_level(Line::Counter(1), false);
    rig.edge(1);

    for _ in 0..10 {
        assert!(rig.timers.take(TimerId::DebouncePoll).is_some());
        assert!(rig.counter.on_poll(&mut rig.pins, &mut rig.timers));
        assert_eq!(rig.pins.mode(Line::Counter(1)), Some(PinMode::HighZ));
    }

    rig.pins.set_level(Line::Counter(1), true);
    assert_eq!(rig.settle(), 2);
    assert_eq!(rig.counter.channel_state(1), Some(ChannelState::Armed));
    assert!(rig.pins.is_armed(Line::Counter(1)));
    assert_eq!(rig.pins.mode(Line::Counter(1)), Some(PinMode::InputPullUp));
    assert_eq!(rig.service.counts()[1], 1);
}

#[test]
fn extra_poll_after_settling_is_harmless() {
    let mut rig = Rig::boot(MockStorage::new());
    rig.pulse(0);
    assert!(!rig.counter.on_poll(&mut rig.pins, &mut rig.timers));
    assert_eq!(rig.timers.pending(TimerId::DebouncePoll), None);
    assert_eq!(rig.counter.channel_state(0), Some(ChannelState::Armed));
    assert_eq!(rig.service.counts(), [1, 0, 0, 0]);
}

#[test]
fn channels_share_one_poll_timer() {
    let mut rig = Rig::boot(MockStorage::new());
    for ch in 0..4 {
        rig.pins.set_level(Line::Counter(ch), false);
        rig.edge(ch);
    }
    assert_eq!(rig.timers.count(TimerId::DebouncePoll), 1);

    for ch in 0..4 {
        rig.pins.set_level(Line::Counter(ch), true);
    }
    rig.settle();
    assert_eq!(rig.service.counts(), [1, 1, 1, 1]);
    assert!(!rig.counter.any_settling());
}

#[test]
fn edges_never_touch_flash() {
    let mut rig = Rig::boot(MockStorage::new());
    let writes = rig.storage().writes;
    for _ in 0..50 {
        rig.pulse(0);
    }
    assert_eq!(rig.storage().writes, writes);
    assert_eq!(rig.service.counts()[0], 50);
}
