//! Fuzz target: `codec::decode`
//!
//! Arbitrary bytes must never panic the decoder. Anything it accepts is a
//! 13-byte frame whose counters fit 24 bits and re-encode to the input.
//!
//! cargo fuzz run fuzz_telemetry_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use pulsecounter::rpc::codec::{self, COUNTER_MASK, FRAME_LEN};

fuzz_target!(|data: &[u8]| {
    if let Ok((id, counts)) = codec::decode(data) {
        assert_eq!(data.len(), FRAME_LEN);
        assert!(counts.iter().all(|&c| c <= COUNTER_MASK));
        assert_eq!(&codec::encode(id, &counts)[..], data);
    }
});
