//! Parameter management types and utilities
//!
//! RAM-only configuration store plus the typed parameter groups read from
//! it at boot. Nothing is persisted across power cycles.

pub mod error;
pub mod failsafe;
pub mod net;
pub mod ppm;
pub mod serial;
pub mod storage;

pub use error::ParameterError;
pub use failsafe::FailsafeParams;
pub use net::NetParams;
pub use ppm::PpmParams;
pub use serial::SerialParams;
pub use storage::{ParamFlags, ParamMetadata, ParamValue, ParameterStore};
pub use storage::{MAX_PARAMS, MAX_STRING_LEN, PARAM_NAME_LEN};

/// Register every parameter group with its defaults
pub fn register_all(store: &mut ParameterStore) -> Result<(), ParameterError> {
    PpmParams::register_defaults(store)?;
    FailsafeParams::register_defaults(store)?;
    SerialParams::register_defaults(store)?;
    NetParams::register_defaults(store)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_all_fits_store() {
        let mut store = ParameterStore::new();
        register_all(&mut store).unwrap();

        assert_eq!(store.len(), 14);
        // NET_PASS hidden
        assert_eq!(store.count(), 13);
    }
}
