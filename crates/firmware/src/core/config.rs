//! Boot configuration
//!
//! Builds the RAM-only parameter store with build-time soft-AP credentials
//! and derives the typed configuration every task starts from.

use rc_bridge_core::failsafe::FailsafeConfig;
use rc_bridge_core::parameters::{
    FailsafeParams, NetParams, ParameterError, ParameterStore, PpmParams, SerialParams,
};
use rc_bridge_core::ppm::PpmConfig;

use crate::platform::error::{ConfigError, PlatformError};

/// Soft-AP SSID baked in at build time (`AP_SSID`)
pub const AP_SSID: &str = env!("AP_SSID");

/// Soft-AP passphrase baked in at build time (`AP_PASSWORD`)
pub const AP_PASSWORD: &str = env!("AP_PASSWORD");

/// Parameter store holding every group at its default
pub fn default_store() -> core::result::Result<ParameterStore, ParameterError> {
    let mut store = ParameterStore::new();
    PpmParams::register_defaults(&mut store)?;
    FailsafeParams::register_defaults(&mut store)?;
    SerialParams::register_defaults(&mut store)?;
    NetParams::register_with(&mut store, AP_SSID, AP_PASSWORD)?;
    Ok(store)
}

/// Typed configuration for all tasks
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub ppm: PpmConfig,
    pub failsafe: FailsafeConfig,
    pub serial: SerialParams,
    pub net: NetParams,
}

impl BridgeConfig {
    /// Read and validate configuration from `store`
    pub fn from_store(store: &ParameterStore) -> crate::platform::Result<Self> {
        let ppm = PpmConfig::from_params(&PpmParams::from_store(store));
        ppm.validate()?;

        let failsafe_params = FailsafeParams::from_store(store);
        if !failsafe_params.is_configured() {
            return Err(PlatformError::InvalidConfig(ConfigError::ZeroTimeout));
        }

        Ok(Self {
            ppm,
            failsafe: FailsafeConfig::from_params(&failsafe_params),
            serial: SerialParams::from_store(store),
            net: NetParams::from_store(store),
        })
    }

    /// Configuration from `store`, or built-in defaults if it is invalid
    ///
    /// Output must come up regardless, so a bad store is logged and ignored.
    pub fn load(store: &ParameterStore) -> Self {
        match Self::from_store(store) {
            Ok(config) => config,
            Err(e) => {
                crate::log_error!("Invalid configuration ({:?}), using defaults", e);
                Self::defaults()
            }
        }
    }

    /// Built-in defaults with the build-time soft-AP credentials
    pub fn defaults() -> Self {
        let mut store = ParameterStore::new();
        // An empty store cannot be full
        let _ = NetParams::register_with(&mut store, AP_SSID, AP_PASSWORD);
        Self {
            ppm: PpmConfig::default(),
            failsafe: FailsafeConfig::default(),
            serial: SerialParams::default(),
            net: NetParams::from_store(&store),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rc_bridge_core::parameters::ParamValue;

    #[test]
    fn test_default_store_is_valid() {
        let store = default_store().unwrap();
        let config = BridgeConfig::from_store(&store).unwrap();

        assert_eq!(config.ppm, PpmConfig::default());
        assert_eq!(config.failsafe.timeout_ms, 500);
        assert_eq!(config.serial.baud_rate, 115_200);
        assert_eq!(config.net.ssid.as_str(), AP_SSID);
    }

    #[test]
    fn test_invalid_frame_rejected() {
        let mut store = default_store().unwrap();
        store.set("PPM_FRAME", ParamValue::Int(10_000)).unwrap();

        assert!(matches!(
            BridgeConfig::from_store(&store),
            Err(PlatformError::InvalidConfig(ConfigError::FrameTooShort { .. }))
        ));
    }

    #[test]
    fn test_load_falls_back_to_defaults() {
        let mut store = default_store().unwrap();
        store.set("FS_TIMEOUT", ParamValue::Int(0)).unwrap();

        let config = BridgeConfig::load(&store);
        assert_eq!(config.failsafe.timeout_ms, 500);
        assert_eq!(config.net.radio_port, 4210);
    }
}
