//! Mock socket session layer

extern crate std;

use std::vec::Vec;

use rc_bridge_core::bridge::{SessionId, SessionSendError, SessionTransport};

/// Records every outbound message instead of sending it
#[derive(Debug, Default)]
pub struct MockSession {
    sent: Vec<(SessionId, Vec<u8>)>,
    refuse: bool,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far, in order
    pub fn sent(&self) -> &[(SessionId, Vec<u8>)] {
        &self.sent
    }

    /// All bytes sent to `session`, concatenated
    pub fn bytes_for(&self, session: SessionId) -> Vec<u8> {
        self.sent
            .iter()
            .filter(|(id, _)| *id == session)
            .flat_map(|(_, data)| data.iter().copied())
            .collect()
    }

    /// Refuse (or accept again) subsequent sends
    pub fn set_refuse(&mut self, refuse: bool) {
        self.refuse = refuse;
    }
}

impl SessionTransport for MockSession {
    fn send_binary(&mut self, session: SessionId, data: &[u8]) -> Result<(), SessionSendError> {
        if self.refuse {
            return Err(SessionSendError);
        }
        self.sent.push((session, data.to_vec()));
        Ok(())
    }
}
