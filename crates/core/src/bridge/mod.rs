//! Serial / socket byte bridge
//!
//! Moves opaque bytes between the flight controller UART and one wireless
//! socket session, one opportunistic step per cooperative loop iteration:
//!
//! - serial → session: whatever the UART has buffered right now, read once
//!   into a bounded buffer and sent as a single unit to the active session.
//!   Dropped when no session is active.
//! - session → serial: inbound binary payloads written straight to the UART.
//!
//! Nothing is buffered across iterations. Back-pressure belongs to the UART
//! driver and the socket layer.

use core::fmt;

use embedded_io::{Error as _, ErrorKind, Read, ReadReady, Write};

/// Default serial read chunk (bytes)
pub const DEFAULT_BRIDGE_BUFFER: usize = 256;

/// Socket session handle assigned by the session layer
pub type SessionId = u32;

/// Notification from the socket session layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent<'a> {
    Connected(SessionId),
    Disconnected(SessionId),
    /// Binary payload received from a session
    Binary(SessionId, &'a [u8]),
}

/// Send failure reported by a [`SessionTransport`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSendError;

/// Outbound half of the socket session layer
pub trait SessionTransport {
    /// Queue `data` as one binary message to `session`
    fn send_binary(&mut self, session: SessionId, data: &[u8]) -> Result<(), SessionSendError>;
}

/// Bridge errors, returned to the loop for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeError {
    /// UART read or write failed
    Serial(ErrorKind),
    /// Session refused an outbound message
    Session(SessionId),
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::Serial(kind) => write!(f, "serial error: {:?}", kind),
            BridgeError::Session(id) => write!(f, "session {} send failed", id),
        }
    }
}

/// Byte counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Bytes forwarded from UART to the session
    pub serial_to_session: u32,
    /// Bytes forwarded from sessions to the UART
    pub session_to_serial: u32,
    /// UART bytes discarded because no session was active
    pub dropped_no_session: u32,
    /// Outbound messages the session layer refused
    pub send_failures: u32,
}

/// Serial/socket bridge with an `N`-byte read buffer
pub struct SerialBridge<const N: usize = DEFAULT_BRIDGE_BUFFER> {
    active: Option<SessionId>,
    buffer: [u8; N],
    stats: BridgeStats,
}

impl<const N: usize> SerialBridge<N> {
    pub const fn new() -> Self {
        Self {
            active: None,
            buffer: [0; N],
            stats: BridgeStats {
                serial_to_session: 0,
                session_to_serial: 0,
                dropped_no_session: 0,
                send_failures: 0,
            },
        }
    }

    /// Session currently receiving serial data
    pub fn active_session(&self) -> Option<SessionId> {
        self.active
    }

    pub fn is_session_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn stats(&self) -> BridgeStats {
        self.stats
    }

    /// Apply a session layer notification
    ///
    /// The most recent connection becomes the serial destination. Binary
    /// payloads are written to the UART whichever session sent them.
    pub fn handle_event<S>(
        &mut self,
        serial: &mut S,
        event: SessionEvent<'_>,
    ) -> Result<(), BridgeError>
    where
        S: Write,
    {
        match event {
            SessionEvent::Connected(id) => {
                self.active = Some(id);
            }
            SessionEvent::Disconnected(id) => {
                if self.active == Some(id) {
                    self.active = None;
                }
            }
            SessionEvent::Binary(_, data) => {
                if data.is_empty() {
                    return Ok(());
                }
                serial
                    .write_all(data)
                    .map_err(|e| BridgeError::Serial(e.kind()))?;
                self.record_session_to_serial(data.len());
            }
        }
        Ok(())
    }

    /// Count `len` session bytes the caller wrote to the UART itself
    ///
    /// For loops that write [`SessionEvent::Binary`] payloads through an
    /// async UART instead of [`handle_event`](Self::handle_event).
    pub fn record_session_to_serial(&mut self, len: usize) {
        self.stats.session_to_serial = self.stats.session_to_serial.wrapping_add(len as u32);
    }

    /// Forward currently available UART bytes to the active session
    ///
    /// Reads at most once, never waits for data. Returns the number of bytes
    /// read from the UART.
    pub fn poll<S, T>(&mut self, serial: &mut S, transport: &mut T) -> Result<usize, BridgeError>
    where
        S: Read + ReadReady,
        T: SessionTransport,
    {
        let ready = serial
            .read_ready()
            .map_err(|e| BridgeError::Serial(e.kind()))?;
        if !ready {
            return Ok(0);
        }

        let len = serial
            .read(&mut self.buffer)
            .map_err(|e| BridgeError::Serial(e.kind()))?;
        if len == 0 {
            return Ok(0);
        }

        let Some(session) = self.active else {
            self.stats.dropped_no_session = self.stats.dropped_no_session.wrapping_add(len as u32);
            return Ok(len);
        };

        match transport.send_binary(session, &self.buffer[..len]) {
            Ok(()) => {
                self.stats.serial_to_session =
                    self.stats.serial_to_session.wrapping_add(len as u32);
                Ok(len)
            }
            Err(SessionSendError) => {
                self.stats.send_failures = self.stats.send_failures.wrapping_add(1);
                Err(BridgeError::Session(session))
            }
        }
    }
}

impl<const N: usize> Default for SerialBridge<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::collections::VecDeque;
    use std::vec;
    use std::vec::Vec;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct UartFault;

    impl embedded_io::Error for UartFault {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    #[derive(Default)]
    struct TestUart {
        rx: VecDeque<u8>,
        tx: Vec<u8>,
        fail_writes: bool,
    }

    impl embedded_io::ErrorType for TestUart {
        type Error = UartFault;
    }

    impl Read for TestUart {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            let n = buf.len().min(self.rx.len());
            for (slot, byte) in buf.iter_mut().zip(self.rx.drain(..n)) {
                *slot = byte;
            }
            Ok(n)
        }
    }

    impl ReadReady for TestUart {
        fn read_ready(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.rx.is_empty())
        }
    }

    impl Write for TestUart {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            if self.fail_writes {
                return Err(UartFault);
            }
            self.tx.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct TestSessions {
        sent: Vec<(SessionId, Vec<u8>)>,
        refuse: bool,
    }

    impl SessionTransport for TestSessions {
        fn send_binary(&mut self, session: SessionId, data: &[u8]) -> Result<(), SessionSendError> {
            if self.refuse {
                return Err(SessionSendError);
            }
            self.sent.push((session, data.to_vec()));
            Ok(())
        }
    }

    #[test]
    fn test_serial_dropped_without_session() {
        let mut bridge: SerialBridge = SerialBridge::new();
        let mut uart = TestUart::default();
        let mut sessions = TestSessions::default();
        uart.rx.extend(b"telemetry");

        assert_eq!(bridge.poll(&mut uart, &mut sessions), Ok(9));
        assert!(sessions.sent.is_empty());
        assert_eq!(bridge.stats().dropped_no_session, 9);
        assert!(uart.rx.is_empty());
    }

    #[test]
    fn test_serial_forwarded_as_one_unit() {
        let mut bridge: SerialBridge = SerialBridge::new();
        let mut uart = TestUart::default();
        let mut sessions = TestSessions::default();

        bridge.handle_event(&mut uart, SessionEvent::Connected(7)).unwrap();
        uart.rx.extend(b"\xfe\x09heartbeat");

        assert_eq!(bridge.poll(&mut uart, &mut sessions), Ok(11));
        assert_eq!(sessions.sent, vec![(7, b"\xfe\x09heartbeat".to_vec())]);
        assert_eq!(bridge.stats().serial_to_session, 11);
    }

    #[test]
    fn test_poll_reads_at_most_one_buffer() {
        let mut bridge: SerialBridge<4> = SerialBridge::new();
        let mut uart = TestUart::default();
        let mut sessions = TestSessions::default();
        bridge.handle_event(&mut uart, SessionEvent::Connected(1)).unwrap();
        uart.rx.extend(b"abcdefghij");

        assert_eq!(bridge.poll(&mut uart, &mut sessions), Ok(4));
        assert_eq!(uart.rx.len(), 6);
        assert_eq!(sessions.sent.len(), 1);
    }

    #[test]
    fn test_poll_idle_uart() {
        let mut bridge: SerialBridge = SerialBridge::new();
        let mut uart = TestUart::default();
        let mut sessions = TestSessions::default();
        bridge.handle_event(&mut uart, SessionEvent::Connected(1)).unwrap();

        assert_eq!(bridge.poll(&mut uart, &mut sessions), Ok(0));
        assert!(sessions.sent.is_empty());
    }

    #[test]
    fn test_binary_written_to_serial() {
        let mut bridge: SerialBridge = SerialBridge::new();
        let mut uart = TestUart::default();

        bridge
            .handle_event(&mut uart, SessionEvent::Binary(3, b"\xfd\x01cmd"))
            .unwrap();
        assert_eq!(uart.tx, b"\xfd\x01cmd");
        assert_eq!(bridge.stats().session_to_serial, 5);
    }

    #[test]
    fn test_newest_session_wins() {
        let mut bridge: SerialBridge = SerialBridge::new();
        let mut uart = TestUart::default();

        bridge.handle_event(&mut uart, SessionEvent::Connected(1)).unwrap();
        bridge.handle_event(&mut uart, SessionEvent::Connected(2)).unwrap();
        assert_eq!(bridge.active_session(), Some(2));

        // Disconnect of a non-active session keeps the destination
        bridge.handle_event(&mut uart, SessionEvent::Disconnected(1)).unwrap();
        assert_eq!(bridge.active_session(), Some(2));

        bridge.handle_event(&mut uart, SessionEvent::Disconnected(2)).unwrap();
        assert!(!bridge.is_session_active());
    }

    #[test]
    fn test_session_refusal_reported() {
        let mut bridge: SerialBridge = SerialBridge::new();
        let mut uart = TestUart::default();
        let mut sessions = TestSessions {
            refuse: true,
            ..Default::default()
        };
        bridge.handle_event(&mut uart, SessionEvent::Connected(5)).unwrap();
        uart.rx.extend(b"data");

        assert_eq!(
            bridge.poll(&mut uart, &mut sessions),
            Err(BridgeError::Session(5))
        );
        assert_eq!(bridge.stats().send_failures, 1);
        // Session stays the destination until the layer reports a disconnect
        assert_eq!(bridge.active_session(), Some(5));
    }

    #[test]
    fn test_externally_written_bytes_counted() {
        let mut bridge: SerialBridge = SerialBridge::new();
        bridge.record_session_to_serial(12);
        bridge.record_session_to_serial(3);
        assert_eq!(bridge.stats().session_to_serial, 15);
    }

    #[test]
    fn test_serial_write_failure_reported() {
        let mut bridge: SerialBridge = SerialBridge::new();
        let mut uart = TestUart {
            fail_writes: true,
            ..Default::default()
        };

        assert_eq!(
            bridge.handle_event(&mut uart, SessionEvent::Binary(1, b"x")),
            Err(BridgeError::Serial(ErrorKind::Other))
        );
        assert_eq!(bridge.stats().session_to_serial, 0);
    }
}
