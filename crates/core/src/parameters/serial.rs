//! Serial Bridge Parameter Definitions
//!
//! - `SERIAL_BAUD` - Flight controller UART baud rate

use super::error::ParameterError;
use super::storage::{ParamFlags, ParamValue, ParameterStore};

/// Default UART baud rate
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialParams {
    pub baud_rate: u32,
}

impl Default for SerialParams {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

impl SerialParams {
    pub fn register_defaults(store: &mut ParameterStore) -> Result<(), ParameterError> {
        store.register(
            "SERIAL_BAUD",
            ParamValue::Int(DEFAULT_BAUD_RATE as i32),
            ParamFlags::empty(),
        )
    }

    pub fn from_store(store: &ParameterStore) -> Self {
        let baud_rate = match store.get_int_or("SERIAL_BAUD", DEFAULT_BAUD_RATE as i32) {
            v if v > 0 => v as u32,
            _ => DEFAULT_BAUD_RATE,
        };
        Self { baud_rate }
    }
}
