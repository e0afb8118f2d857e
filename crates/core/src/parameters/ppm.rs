//! PPM Output Parameter Definitions
//!
//! # Parameters
//!
//! - `PPM_PULSE` - Fixed pulse width at the start of each channel (µs)
//! - `PPM_FRAME` - Total frame length (µs)
//! - `PPM_MIN` - Lower clamp for channel widths (µs)
//! - `PPM_MAX` - Upper clamp for channel widths (µs)
//! - `PPM_MIN_FILL` - Shortest permitted frame fill (µs)
//! - `PPM_INVERT` - Active level is low (1) or high (0)

use super::error::ParameterError;
use super::storage::{ParamFlags, ParamValue, ParameterStore};

/// PPM output parameters loaded from parameter store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PpmParams {
    pub pulse_us: u16,
    pub frame_us: u32,
    pub min_fill_us: u32,
    pub min_us: u16,
    pub max_us: u16,
    /// Active pulse drives the line low
    pub invert: bool,
}

impl Default for PpmParams {
    fn default() -> Self {
        Self {
            pulse_us: 300,
            frame_us: 22_500,
            min_fill_us: 400,
            min_us: 800,
            max_us: 2200,
            invert: true,
        }
    }
}

impl PpmParams {
    /// Register PPM parameters with default values
    pub fn register_defaults(store: &mut ParameterStore) -> Result<(), ParameterError> {
        let d = Self::default();
        store.register("PPM_PULSE", ParamValue::Int(d.pulse_us as i32), ParamFlags::empty())?;
        store.register("PPM_FRAME", ParamValue::Int(d.frame_us as i32), ParamFlags::empty())?;
        store.register("PPM_MIN", ParamValue::Int(d.min_us as i32), ParamFlags::empty())?;
        store.register("PPM_MAX", ParamValue::Int(d.max_us as i32), ParamFlags::empty())?;
        store.register(
            "PPM_MIN_FILL",
            ParamValue::Int(d.min_fill_us as i32),
            ParamFlags::empty(),
        )?;
        store.register("PPM_INVERT", ParamValue::Bool(d.invert), ParamFlags::empty())?;
        Ok(())
    }

    /// Load PPM parameters from parameter store
    ///
    /// Missing or out-of-range values fall back to defaults.
    pub fn from_store(store: &ParameterStore) -> Self {
        let d = Self::default();
        let u16_or = |name: &str, default: u16| {
            u16::try_from(store.get_int_or(name, default as i32)).unwrap_or(default)
        };
        let u32_or = |name: &str, default: u32| {
            u32::try_from(store.get_int_or(name, default as i32)).unwrap_or(default)
        };

        Self {
            pulse_us: u16_or("PPM_PULSE", d.pulse_us),
            frame_us: u32_or("PPM_FRAME", d.frame_us),
            min_fill_us: u32_or("PPM_MIN_FILL", d.min_fill_us),
            min_us: u16_or("PPM_MIN", d.min_us),
            max_us: u16_or("PPM_MAX", d.max_us),
            invert: store.get_bool_or("PPM_INVERT", d.invert),
        }
    }
}
