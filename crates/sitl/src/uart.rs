//! Simulated UART peripheral for SITL.
//!
//! Provides in-memory ring buffers for both directions of the flight
//! controller link. Clones share the same buffers: the control loop uses the
//! `embedded-io` side, the simulated flight controller uses
//! [`inject_rx_data`](SitlUart::inject_rx_data) and
//! [`drain_tx`](SitlUart::drain_tx).

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use embedded_io::{ErrorKind, ErrorType, Read, ReadReady, Write};

#[derive(Debug)]
struct Buffers {
    /// Flight controller to bridge
    rx: VecDeque<u8>,
    /// Bridge to flight controller
    tx: VecDeque<u8>,
}

/// Simulated UART with in-memory ring buffers.
#[derive(Debug, Clone)]
pub struct SitlUart {
    baud_rate: u32,
    capacity: usize,
    buffers: Arc<Mutex<Buffers>>,
}

impl SitlUart {
    /// Default buffer capacity in bytes.
    const DEFAULT_CAPACITY: usize = 4096;

    /// Create a new SITL UART with the given baud rate.
    pub fn new(baud_rate: u32) -> Self {
        Self::with_capacity(baud_rate, Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(baud_rate: u32, capacity: usize) -> Self {
        Self {
            baud_rate,
            capacity,
            buffers: Arc::new(Mutex::new(Buffers {
                rx: VecDeque::with_capacity(capacity),
                tx: VecDeque::with_capacity(capacity),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Buffers> {
        // A panicked holder cannot leave the deques in a torn state
        self.buffers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Check if data is waiting for the bridge.
    pub fn available(&self) -> bool {
        !self.lock().rx.is_empty()
    }

    /// Inject data into the RX buffer (simulating the flight controller
    /// sending). Bytes beyond capacity are dropped, like a FIFO overrun.
    pub fn inject_rx_data(&self, data: &[u8]) -> usize {
        let mut buffers = self.lock();
        let room = self.capacity.saturating_sub(buffers.rx.len());
        let accepted = data.len().min(room);
        buffers.rx.extend(&data[..accepted]);
        accepted
    }

    /// Drain the TX buffer (everything the bridge wrote so far).
    pub fn drain_tx(&self) -> Vec<u8> {
        self.lock().tx.drain(..).collect()
    }

    /// Get the current baud rate.
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }
}

impl ErrorType for SitlUart {
    type Error = ErrorKind;
}

impl Read for SitlUart {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut buffers = self.lock();
        let to_read = buf.len().min(buffers.rx.len());
        for (slot, byte) in buf.iter_mut().zip(buffers.rx.drain(..to_read)) {
            *slot = byte;
        }
        Ok(to_read)
    }
}

impl ReadReady for SitlUart {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.available())
    }
}

impl Write for SitlUart {
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        if data.is_empty() {
            return Ok(0);
        }
        let mut buffers = self.lock();
        let room = self.capacity.saturating_sub(buffers.tx.len());
        if room == 0 {
            return Err(ErrorKind::OutOfMemory);
        }
        let to_write = data.len().min(room);
        buffers.tx.extend(&data[..to_write]);
        Ok(to_write)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        // No-op: data is immediately available in the buffer
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_drain() {
        let mut uart = SitlUart::new(115200);
        uart.write_all(b"Hello").unwrap();
        assert_eq!(uart.drain_tx(), b"Hello");
        assert!(uart.drain_tx().is_empty());
    }

    #[test]
    fn test_inject_and_read() {
        let mut uart = SitlUart::new(115200);
        assert!(!uart.read_ready().unwrap());

        uart.inject_rx_data(b"World");
        assert!(uart.read_ready().unwrap());

        let mut buf = [0u8; 5];
        assert_eq!(uart.read(&mut buf).unwrap(), 5);
        assert_eq!(&buf, b"World");
        assert!(!uart.available());
    }

    #[test]
    fn test_partial_read() {
        let mut uart = SitlUart::new(115200);
        uart.inject_rx_data(b"Hello World");

        let mut buf = [0u8; 5];
        assert_eq!(uart.read(&mut buf).unwrap(), 5);
        assert_eq!(&buf, b"Hello");
        assert!(uart.available());
    }

    #[test]
    fn test_clones_share_buffers() {
        let flight_controller = SitlUart::new(57600);
        let mut bridge = flight_controller.clone();

        flight_controller.inject_rx_data(b"\xfe\x01");
        let mut buf = [0u8; 8];
        assert_eq!(bridge.read(&mut buf).unwrap(), 2);

        bridge.write_all(b"cmd").unwrap();
        assert_eq!(flight_controller.drain_tx(), b"cmd");
        assert_eq!(bridge.baud_rate(), 57600);
    }

    #[test]
    fn test_full_buffers() {
        let mut uart = SitlUart::with_capacity(115200, 4);
        assert_eq!(uart.inject_rx_data(b"abcdef"), 4);

        assert_eq!(uart.write(b"123456").unwrap(), 4);
        assert_eq!(uart.write(b"7"), Err(ErrorKind::OutOfMemory));
    }
}
