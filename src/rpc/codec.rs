//! Telemetry frame codec.
//!
//! Wire format (13 bytes):
//! ```text
//! ┌───────────┬──────────────┬──────────────┬──────────────┐
//! │ module_id │ word0 (BE32) │ word1 (BE32) │ word2 (BE32) │
//! │    1B     │      4B      │      4B      │      4B      │
//! └───────────┴──────────────┴──────────────┴──────────────┘
//!
//! word0 = c0[23:0] << 8  | c1[23:16]
//! word1 = c1[15:0] << 16 | c2[23:8]
//! word2 = c2[7:0]  << 24 | c3[23:0]
//! ```
//!
//! Each counter travels as a 24-bit quantity, packed most-significant
//! first with no padding. Counts at or above 2^24 lose their top byte on
//! encode. That truncation is part of the wire contract: receivers
//! reconstruct wrap-around from successive frames, so widening the field
//! would break every deployed decoder.

use crate::config::NUM_CHANNELS;

/// Counters carried per frame.
pub const FRAME_COUNTERS: usize = 4;

const _: () = assert!(NUM_CHANNELS == FRAME_COUNTERS);

/// Width of one packed counter.
pub const COUNTER_BITS: u32 = 24;
/// Mask selecting the transmitted part of a counter.
pub const COUNTER_MASK: u32 = (1 << COUNTER_BITS) - 1;

/// Packed counter block: 4 × 24 bits.
pub const PACKED_LEN: usize = 12;
/// Module id byte + packed block.
pub const FRAME_LEN: usize = 1 + PACKED_LEN;

/// Reasons a received frame cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// Frame is not exactly [`FRAME_LEN`] bytes.
    Length(usize),
}

impl core::fmt::Display for CodecError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Length(n) => write!(f, "frame length {} (expected {})", n, FRAME_LEN),
        }
    }
}

/// Pack four counters into 12 bytes, dropping bits 31..24 of each.
pub fn pack(counts: &[u32; FRAME_COUNTERS]) -> [u8; PACKED_LEN] {
    let [c0, c1, c2, c3] = (*counts).map(|c| c & COUNTER_MASK);

    let word0 = (c0 << 8) | ((c1 >> 16) & 0xFF);
    let word1 = ((c1 & 0xFFFF) << 16) | ((c2 >> 8) & 0xFFFF);
    let word2 = ((c2 & 0xFF) << 24) | (c3 & COUNTER_MASK);

    let mut out = [0u8; PACKED_LEN];
    out[0..4].copy_from_slice(&word0.to_be_bytes());
    out[4..8].copy_from_slice(&word1.to_be_bytes());
    out[8..12].copy_from_slice(&word2.to_be_bytes());
    out
}

/// Inverse of [`pack`]. Every result is `< 2^24`.
pub fn unpack(packed: &[u8; PACKED_LEN]) -> [u32; FRAME_COUNTERS] {
    let word = |i: usize| {
        u32::from_be_bytes([packed[i], packed[i + 1], packed[i + 2], packed[i + 3]])
    };
    let (word0, word1, word2) = (word(0), word(4), word(8));

    [
        word0 >> 8,
        ((word0 & 0xFF) << 16) | (word1 >> 16),
        ((word1 & 0xFFFF) << 8) | (word2 >> 24),
        word2 & COUNTER_MASK,
    ]
}

/// Build the full frame: module id followed by the packed block.
pub fn encode(module_id: u8, counts: &[u32; FRAME_COUNTERS]) -> [u8; FRAME_LEN] {
    let mut frame = [0u8; FRAME_LEN];
    frame[0] = module_id;
    frame[1..].copy_from_slice(&pack(counts));
    frame
}

/// Split a received frame into module id and counters.
pub fn decode(frame: &[u8]) -> Result<(u8, [u32; FRAME_COUNTERS]), CodecError> {
    let (&module_id, rest) = frame
        .split_first()
        .ok_or(CodecError::Length(frame.len()))?;
    let packed: &[u8; PACKED_LEN] = rest
        .try_into()
        .map_err(|_| CodecError::Length(frame.len()))?;
    Ok((module_id, unpack(packed)))
}

/// One encoded telemetry publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryFrame {
    bytes: [u8; FRAME_LEN],
}

impl TelemetryFrame {
    pub fn new(module_id: u8, counts: &[u32; FRAME_COUNTERS]) -> Self {
        Self {
            bytes: encode(module_id, counts),
        }
    }

    pub fn module_id(&self) -> u8 {
        self.bytes[0]
    }

    /// Counters as the receiver will see them (24-bit truncated).
    pub fn counts(&self) -> [u32; FRAME_COUNTERS] {
        let mut packed = [0u8; PACKED_LEN];
        packed.copy_from_slice(&self.bytes[1..]);
        unpack(&packed)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}
