//! Boot restore and remote command handling.

use embassy_time::Duration;

use pulsecounter::app::ports::TimerId;
use pulsecounter::app::commands::AppCommand;
use pulsecounter::config::{CONFIG_IMAGE_MAX, CounterConfig, CounterSettings};
use pulsecounter::rpc::command::{self, ReplyStatus};

use crate::mock_hw::{MockStorage, Rig};

fn image(counts: [u32; 4], period: u8) -> Vec<u8> {
    let mut buf = [0u8; CONFIG_IMAGE_MAX];
    let len = CounterConfig::snapshot(counts, period)
        .to_image(&mut buf)
        .unwrap();
    buf[..len].to_vec()
}

fn stored_config(rig: &Rig) -> CounterConfig {
    CounterConfig::from_image(rig.storage().blob().expect("image written")).unwrap()
}

fn hours(h: u64) -> Duration {
    Duration::from_secs(h * 3600)
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn erased_flash_boots_with_defaults_and_writes_them() {
    let mut rig = Rig::boot(MockStorage::with_blob(&[0xFF; CONFIG_IMAGE_MAX]));

    assert_eq!(rig.service.counts(), [0; 4]);
    assert_eq!(rig.service.period(), 1);
    assert_eq!(rig.storage().writes, 1);

    let cfg = stored_config(&rig);
    assert_eq!(cfg.valid, CounterConfig::VALID);
    assert_eq!(cfg.counts, [0; 4]);
    assert_eq!(cfg.publish_period, 1);

    assert_eq!(rig.command(&[2]), None);
    assert_eq!(rig.drain(), 1);
    assert_eq!(
        rig.last_frame().unwrap().as_bytes(),
        &[0x08, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]
    );
}

#[test]
fn first_boot_without_image_writes_defaults() {
    let rig = Rig::boot(MockStorage::new());
    assert_eq!(rig.storage().writes, 1);
    assert_eq!(stored_config(&rig).publish_period, 1);
}

#[test]
fn valid_image_is_restored_untouched() {
    let rig = Rig::boot(MockStorage::with_blob(&image([10, 20, 30, 40], 6)));
    assert_eq!(rig.service.counts(), [10, 20, 30, 40]);
    assert_eq!(rig.service.period(), 6);
    assert_eq!(rig.storage().writes, 0);
    assert_eq!(rig.timers.pending(TimerId::Publish), Some(hours(6)));
}

#[test]
fn image_marked_invalid_is_discarded() {
    let mut cfg = CounterConfig::snapshot([5, 5, 5, 5], 3);
    cfg.valid = 0;
    let mut buf = [0u8; CONFIG_IMAGE_MAX];
    let len = cfg.to_image(&mut buf).unwrap();

    let rig = Rig::boot(MockStorage::with_blob(&buf[..len]));
    assert_eq!(rig.service.counts(), [0; 4]);
    assert_eq!(rig.service.period(), 1);
    assert_eq!(rig.storage().writes, 1);
}

#[test]
fn truncated_image_is_discarded() {
    let full = image([1, 2, 3, 4], 2);
    let rig = Rig::boot(MockStorage::with_blob(&full[..3]));
    assert_eq!(rig.service.counts(), [0; 4]);
    assert_eq!(rig.service.period(), 1);
}

#[test]
fn custom_module_id_keys_its_own_image() {
    let settings = CounterSettings {
        module_id: 0x21,
        ..CounterSettings::default()
    };
    // An image under the default key does not belong to module 0x21.
    let mut rig = Rig::boot_with(settings, MockStorage::with_blob(&image([9, 9, 9, 9], 4)));
    assert_eq!(rig.service.counts(), [0; 4]);
    assert_eq!(rig.command(&[3]), Some([0x21, 0]));
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn poll_reports_counted_pulses() {
    let mut rig = Rig::boot(MockStorage::new());
    for _ in 0..3 {
        rig.pulse(0);
    }
    rig.pulse(1);

    assert_eq!(rig.command(&[2]), None);
    assert_eq!(rig.drain(), 1);

    let frame = rig.last_frame().unwrap();
    assert_eq!(frame.module_id(), 0x08);
    assert_eq!(frame.counts(), [3, 1, 0, 0]);
    assert_eq!(stored_config(&rig).counts, [3, 1, 0, 0]);
}

#[test]
fn set_period_accepts_and_rejects() {
    let mut rig = Rig::boot(MockStorage::new());

    assert_eq!(rig.command(&[1, 5]), Some([0x08, 0]));
    assert_eq!(rig.service.period(), 5);
    assert_eq!(rig.timers.pending(TimerId::Publish), Some(hours(5)));
    assert_eq!(stored_config(&rig).publish_period, 5);

    let writes = rig.storage().writes;
    assert_eq!(rig.command(&[1, 0]), Some([0x08, 253]));
    assert_eq!(rig.service.period(), 5);
    assert_eq!(rig.storage().writes, writes, "rejected period is not persisted");
}

#[test]
fn period_boundaries() {
    let mut rig = Rig::boot(MockStorage::new());
    assert_eq!(rig.command(&[1, 1]), Some([0x08, 0]));
    assert_eq!(rig.command(&[1, 24]), Some([0x08, 0]));
    assert_eq!(rig.service.period(), 24);
    assert_eq!(rig.command(&[1, 25]), Some([0x08, 253]));
    assert_eq!(rig.command(&[1, 255]), Some([0x08, 253]));
    assert_eq!(rig.service.period(), 24);
}

#[test]
fn reset_zeroes_counters_and_persists() {
    let mut rig = Rig::boot(MockStorage::with_blob(&image([7, 7, 7, 7], 3)));
    rig.pulse(2);

    assert_eq!(rig.command(&[3]), Some([0x08, 0]));
    assert_eq!(rig.service.counts(), [0; 4]);
    assert_eq!(rig.service.period(), 3, "remote reset keeps the period");
    assert_eq!(stored_config(&rig).counts, [0; 4]);

    rig.command(&[2]);
    rig.drain();
    assert_eq!(rig.last_frame().unwrap().counts(), [0; 4]);
}

#[test]
fn malformed_frames_are_ignored() {
    let mut rig = Rig::boot(MockStorage::new());
    rig.pulse(0);
    let writes = rig.storage().writes;

    let frames: [&[u8]; 8] = [&[], &[0], &[4], &[0xFF, 1], &[1], &[1, 2, 3], &[2, 0], &[3, 0]];
    for frame in frames {
        assert_eq!(rig.command(frame), None, "frame {:?}", frame);
    }
    assert_eq!(rig.service.counts(), [1, 0, 0, 0]);
    assert_eq!(rig.service.period(), 1);
    assert_eq!(rig.storage().writes, writes);
    assert!(rig.queue.is_empty());
}

#[test]
fn encoded_commands_round_trip_through_the_service() {
    let mut rig = Rig::boot(MockStorage::new());
    let reply = rig.command(&command::encode(AppCommand::SetPeriod(8))).unwrap();
    assert_eq!(reply[1], ReplyStatus::Ok as u8);
    assert_eq!(rig.service.period(), 8);
}

#[test]
fn counts_survive_a_reboot() {
    let mut rig = Rig::boot(MockStorage::new());
    rig.pulse(0);
    rig.pulse(3);
    rig.command(&[1, 12]);
    rig.command(&[2]);
    rig.drain();

    let blob = rig.storage().blob().unwrap().to_vec();
    let rebooted = Rig::boot(MockStorage::with_blob(&blob));
    assert_eq!(rebooted.service.counts(), [1, 0, 0, 1]);
    assert_eq!(rebooted.service.period(), 12);
}
