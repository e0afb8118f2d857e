//! Wireless frame receiver
//!
//! Runs inside the radio driver's receive callback. It validates and decodes
//! a payload, hands accepted frames to the [`ControlLink`] and stamps link
//! freshness. Rejected payloads only bump a counter: the receive context
//! must not log, allocate or propagate errors.

use crate::protocol::{decode_frame, DecodeOutcome};
use crate::shared::ControlLink;

/// Largest payload a radio transport needs to buffer
///
/// Only the first [`ENCODED_FRAME_LEN`](crate::protocol::ENCODED_FRAME_LEN)
/// bytes are decoded; the rest is ignored.
pub const MAX_PAYLOAD_LEN: usize = 512;

/// Identity of the transmitter that sent a payload
///
/// Opaque to the receiver. Radio transports map their own addressing
/// (MAC, IP endpoint) into these bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeerId(pub [u8; 6]);

/// Hands decoded frames from the receive callback to the control link
#[derive(Clone, Copy)]
pub struct FrameReceiver<'a> {
    link: &'a ControlLink,
}

impl<'a> FrameReceiver<'a> {
    pub const fn new(link: &'a ControlLink) -> Self {
        Self { link }
    }

    /// Handle one inbound payload
    ///
    /// On acceptance the frame is published, the freshness timestamp is set
    /// to `now_ms` and the link is marked as established. On rejection
    /// nothing but the reject counter changes.
    pub fn on_receive(&self, _sender: PeerId, payload: &[u8], now_ms: u64) -> DecodeOutcome {
        let outcome = decode_frame(payload);
        match outcome {
            DecodeOutcome::Accepted(frame) => {
                self.link.accept(frame, now_ms);
                self.link.stats().record_accepted();
            }
            DecodeOutcome::Rejected(_) => {
                self.link.stats().record_rejected();
            }
        }
        outcome
    }
}
