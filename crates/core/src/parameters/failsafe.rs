//! Failsafe Parameter Definitions
//!
//! # Parameters
//!
//! - `FS_TIMEOUT` - Control link silence before failsafe engages (ms)
//! - `FS_PULSE` - Channel width published on failsafe (µs)

use super::error::ParameterError;
use super::storage::{ParamFlags, ParamValue, ParameterStore};

/// Failsafe parameters loaded from parameter store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailsafeParams {
    /// Link timeout (ms)
    pub timeout_ms: u32,
    /// Failsafe channel width (µs)
    pub pulse_us: u16,
}

impl Default for FailsafeParams {
    fn default() -> Self {
        Self {
            timeout_ms: 500,
            pulse_us: 900,
        }
    }
}

impl FailsafeParams {
    /// Register failsafe parameters with default values
    pub fn register_defaults(store: &mut ParameterStore) -> Result<(), ParameterError> {
        let d = Self::default();
        store.register("FS_TIMEOUT", ParamValue::Int(d.timeout_ms as i32), ParamFlags::empty())?;
        store.register("FS_PULSE", ParamValue::Int(d.pulse_us as i32), ParamFlags::empty())?;
        Ok(())
    }

    /// Load failsafe parameters from parameter store
    pub fn from_store(store: &ParameterStore) -> Self {
        let d = Self::default();
        let timeout_ms = u32::try_from(store.get_int_or("FS_TIMEOUT", d.timeout_ms as i32))
            .unwrap_or(d.timeout_ms);
        let pulse_us = u16::try_from(store.get_int_or("FS_PULSE", d.pulse_us as i32))
            .unwrap_or(d.pulse_us);

        Self {
            timeout_ms,
            pulse_us,
        }
    }

    /// Check if failsafe configuration is valid
    pub fn is_configured(&self) -> bool {
        self.timeout_ms > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_defaults() {
        let mut store = ParameterStore::new();
        FailsafeParams::register_defaults(&mut store).unwrap();

        assert_eq!(store.get("FS_TIMEOUT"), Some(&ParamValue::Int(500)));
        assert_eq!(store.get("FS_PULSE"), Some(&ParamValue::Int(900)));
    }

    #[test]
    fn test_from_store_custom_values() {
        let mut store = ParameterStore::new();
        FailsafeParams::register_defaults(&mut store).unwrap();
        store.set("FS_TIMEOUT", ParamValue::Int(1000)).unwrap();

        let params = FailsafeParams::from_store(&store);
        assert_eq!(params.timeout_ms, 1000);
        assert_eq!(params.pulse_us, 900);
        assert!(params.is_configured());
    }

    #[test]
    fn test_zero_timeout_not_configured() {
        let params = FailsafeParams {
            timeout_ms: 0,
            pulse_us: 900,
        };
        assert!(!params.is_configured());
    }
}
