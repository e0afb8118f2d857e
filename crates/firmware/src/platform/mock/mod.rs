//! Mock platform implementations for host testing
//!
//! In-memory stand-ins for the flight controller UART and the socket session
//! layer, so the cooperative loop can be exercised without hardware.

pub mod session;
pub mod uart;

pub use session::MockSession;
pub use uart::{MockUart, MockUartError};
