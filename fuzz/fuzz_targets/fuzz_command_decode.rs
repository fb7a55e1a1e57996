//! Fuzz target: `command::decode`
//!
//! Feeds raw bus frames to the remote command decoder. It must never
//! panic, and an accepted frame must re-encode byte for byte.
//!
//! cargo fuzz run fuzz_command_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use pulsecounter::rpc::command;

fuzz_target!(|data: &[u8]| {
    if let Ok(cmd) = command::decode(data) {
        assert_eq!(&command::encode(cmd)[..], data);
    }
});
