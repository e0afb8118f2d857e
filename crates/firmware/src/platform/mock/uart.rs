//! Mock UART implementation for testing

extern crate std;

use std::collections::VecDeque;
use std::vec::Vec;

use embedded_io::{ErrorKind, ErrorType, Read, ReadReady, Write};

/// Error returned by [`MockUart`] when a failure is injected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockUartError(pub ErrorKind);

impl embedded_io::Error for MockUartError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// Mock UART implementation
///
/// Provides in-memory buffers for transmit and receive data,
/// allowing unit tests to verify UART operations without hardware.
///
/// # Example
///
/// ```ignore
/// use rc_bridge_firmware::platform::mock::MockUart;
/// use embedded_io::{Read, Write};
///
/// let mut uart = MockUart::new(115_200);
///
/// uart.write_all(b"Hello").unwrap();
/// assert_eq!(uart.tx_buffer(), b"Hello");
///
/// uart.inject_rx_data(b"World");
/// let mut buf = [0u8; 5];
/// uart.read(&mut buf).unwrap();
/// assert_eq!(&buf, b"World");
/// ```
#[derive(Debug, Default)]
pub struct MockUart {
    baud_rate: u32,
    tx_buffer: Vec<u8>,
    rx_buffer: VecDeque<u8>,
    fail_with: Option<ErrorKind>,
}

impl MockUart {
    pub fn new(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            ..Default::default()
        }
    }

    /// Get transmitted data (for test verification)
    pub fn tx_buffer(&self) -> &[u8] {
        &self.tx_buffer
    }

    /// Clear transmit buffer
    pub fn clear_tx_buffer(&mut self) {
        self.tx_buffer.clear();
    }

    /// Inject receive data (for test setup)
    pub fn inject_rx_data(&mut self, data: &[u8]) {
        self.rx_buffer.extend(data);
    }

    /// Bytes waiting to be read
    pub fn rx_pending(&self) -> usize {
        self.rx_buffer.len()
    }

    /// Make every following operation fail with `kind`
    pub fn inject_fault(&mut self, kind: ErrorKind) {
        self.fail_with = Some(kind);
    }

    pub fn clear_fault(&mut self) {
        self.fail_with = None;
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    fn check(&self) -> Result<(), MockUartError> {
        match self.fail_with {
            Some(kind) => Err(MockUartError(kind)),
            None => Ok(()),
        }
    }
}

impl ErrorType for MockUart {
    type Error = MockUartError;
}

impl Read for MockUart {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.check()?;
        let to_read = buf.len().min(self.rx_buffer.len());
        for (slot, byte) in buf.iter_mut().zip(self.rx_buffer.drain(..to_read)) {
            *slot = byte;
        }
        Ok(to_read)
    }
}

impl ReadReady for MockUart {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        self.check()?;
        Ok(!self.rx_buffer.is_empty())
    }
}

impl Write for MockUart {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.check()?;
        self.tx_buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.check()
    }
}

impl embedded_io_async::Write for MockUart {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        Write::write(self, buf)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Write::flush(self)
    }
}
