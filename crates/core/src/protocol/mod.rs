//! Wireless control frame codec
//!
//! Wire layout of a control payload:
//!
//! ```text
//! +-------+-----------+-----------+-----+-----------+-----+
//! | 0xA5  | ch0 (LE)  | ch1 (LE)  | ... | ch7 (LE)  | 0x5A|
//! +-------+-----------+-----------+-----+-----------+-----+
//!   1 B      2 B         2 B               2 B        1 B
//! ```
//!
//! Decoding never fails loudly. A payload that cannot be used is reported as
//! [`DecodeOutcome::Rejected`] and the caller discards it.

use core::fmt;

use crate::channels::{ChannelFrame, CHANNEL_COUNT};

/// Leading framing marker
pub const FRAME_START: u8 = 0xA5;

/// Trailing framing marker
pub const FRAME_END: u8 = 0x5A;

/// Encoded size of one control payload
pub const ENCODED_FRAME_LEN: usize = 1 + CHANNEL_COUNT * 2 + 1;

/// Why an inbound payload was discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Payload shorter than [`ENCODED_FRAME_LEN`]
    TooShort { len: usize },
    /// First byte is not [`FRAME_START`]
    BadStartMarker(u8),
    /// Byte after the channel block is not [`FRAME_END`]
    BadEndMarker(u8),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::TooShort { len } => {
                write!(f, "payload too short ({} < {} bytes)", len, ENCODED_FRAME_LEN)
            }
            RejectReason::BadStartMarker(b) => write!(f, "bad start marker 0x{:02x}", b),
            RejectReason::BadEndMarker(b) => write!(f, "bad end marker 0x{:02x}", b),
        }
    }
}

/// Result of decoding one inbound payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// Payload carried a well-formed channel block
    Accepted(ChannelFrame),
    /// Payload was discarded
    Rejected(RejectReason),
}

impl DecodeOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, DecodeOutcome::Accepted(_))
    }
}

/// Decode a control payload
///
/// Bytes beyond [`ENCODED_FRAME_LEN`] are ignored. Channel values are taken
/// as-is; out-of-range values are limited later by the pulse generator.
pub fn decode_frame(payload: &[u8]) -> DecodeOutcome {
    if payload.len() < ENCODED_FRAME_LEN {
        return DecodeOutcome::Rejected(RejectReason::TooShort { len: payload.len() });
    }
    if payload[0] != FRAME_START {
        return DecodeOutcome::Rejected(RejectReason::BadStartMarker(payload[0]));
    }
    let end = payload[ENCODED_FRAME_LEN - 1];
    if end != FRAME_END {
        return DecodeOutcome::Rejected(RejectReason::BadEndMarker(end));
    }

    let mut values = [0u16; CHANNEL_COUNT];
    for (value, chunk) in values
        .iter_mut()
        .zip(payload[1..ENCODED_FRAME_LEN - 1].chunks_exact(2))
    {
        *value = u16::from_le_bytes([chunk[0], chunk[1]]);
    }

    DecodeOutcome::Accepted(ChannelFrame::new(values))
}

/// Encode a frame into the wire layout
pub fn encode_frame(frame: &ChannelFrame) -> [u8; ENCODED_FRAME_LEN] {
    let mut out = [0u8; ENCODED_FRAME_LEN];
    out[0] = FRAME_START;
    for (chunk, value) in out[1..ENCODED_FRAME_LEN - 1]
        .chunks_exact_mut(2)
        .zip(frame.values().iter())
    {
        chunk.copy_from_slice(&value.to_le_bytes());
    }
    out[ENCODED_FRAME_LEN - 1] = FRAME_END;
    out
}
