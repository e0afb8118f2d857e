//! Network Parameter Definitions
//!
//! # Parameters
//!
//! - `NET_SSID` - Soft-AP network name
//! - `NET_PASS` - WPA2 passphrase (hidden; empty or shorter than 8 means open)
//! - `NET_RADIO_PORT` - UDP port receiving control frames
//! - `NET_BRIDGE_PORT` - TCP port of the serial bridge session
//! - `NET_STATUS_PORT` - HTTP status page port

use heapless::String;

use super::error::ParameterError;
use super::storage::{ParamFlags, ParamValue, ParameterStore};

pub const DEFAULT_SSID: &str = "rc-bridge";
pub const DEFAULT_RADIO_PORT: u16 = 4210;
pub const DEFAULT_BRIDGE_PORT: u16 = 8888;
pub const DEFAULT_STATUS_PORT: u16 = 80;

/// Maximum SSID length (802.11)
pub const SSID_MAX_LEN: usize = 32;
/// Maximum WPA2 passphrase length
pub const PASSWORD_MAX_LEN: usize = 63;
/// Minimum WPA2 passphrase length
pub const PASSWORD_MIN_LEN: usize = 8;

/// Network parameters loaded from parameter store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetParams {
    pub ssid: String<SSID_MAX_LEN>,
    pub password: String<PASSWORD_MAX_LEN>,
    pub radio_port: u16,
    pub bridge_port: u16,
    pub status_port: u16,
}

fn truncated<const N: usize>(value: &str) -> String<N> {
    let mut s = String::new();
    for c in value.chars() {
        if s.push(c).is_err() {
            break;
        }
    }
    s
}

impl NetParams {
    /// Register network parameters with the built-in defaults
    pub fn register_defaults(store: &mut ParameterStore) -> Result<(), ParameterError> {
        Self::register_with(store, DEFAULT_SSID, "")
    }

    /// Register network parameters with provisioned credentials
    pub fn register_with(
        store: &mut ParameterStore,
        ssid: &str,
        password: &str,
    ) -> Result<(), ParameterError> {
        store.register("NET_SSID", ParamValue::string(ssid), ParamFlags::empty())?;
        store.register("NET_PASS", ParamValue::string(password), ParamFlags::HIDDEN)?;
        store.register(
            "NET_RADIO_PORT",
            ParamValue::Int(DEFAULT_RADIO_PORT as i32),
            ParamFlags::empty(),
        )?;
        store.register(
            "NET_BRIDGE_PORT",
            ParamValue::Int(DEFAULT_BRIDGE_PORT as i32),
            ParamFlags::empty(),
        )?;
        store.register(
            "NET_STATUS_PORT",
            ParamValue::Int(DEFAULT_STATUS_PORT as i32),
            ParamFlags::empty(),
        )?;
        Ok(())
    }

    /// Load network parameters from parameter store
    pub fn from_store(store: &ParameterStore) -> Self {
        let port_or = |name: &str, default: u16| {
            u16::try_from(store.get_int_or(name, default as i32))
                .ok()
                .filter(|port| *port != 0)
                .unwrap_or(default)
        };
        let ssid = store
            .get("NET_SSID")
            .and_then(ParamValue::as_str)
            .unwrap_or(DEFAULT_SSID);
        let password = store
            .get("NET_PASS")
            .and_then(ParamValue::as_str)
            .unwrap_or("");

        Self {
            ssid: truncated(ssid),
            password: truncated(password),
            radio_port: port_or("NET_RADIO_PORT", DEFAULT_RADIO_PORT),
            bridge_port: port_or("NET_BRIDGE_PORT", DEFAULT_BRIDGE_PORT),
            status_port: port_or("NET_STATUS_PORT", DEFAULT_STATUS_PORT),
        }
    }

    /// Whether the soft-AP should require WPA2
    pub fn is_secured(&self) -> bool {
        self.password.len() >= PASSWORD_MIN_LEN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let mut store = ParameterStore::new();
        NetParams::register_defaults(&mut store).unwrap();

        let params = NetParams::from_store(&store);
        assert_eq!(params.ssid.as_str(), "rc-bridge");
        assert_eq!(params.radio_port, 4210);
        assert_eq!(params.bridge_port, 8888);
        assert_eq!(params.status_port, 80);
        assert!(!params.is_secured());
    }

    #[test]
    fn test_password_hidden() {
        let mut store = ParameterStore::new();
        NetParams::register_with(&mut store, "field-ap", "hunter2hunter2").unwrap();

        assert!(store.is_hidden("NET_PASS"));
        assert!(store.iter_names().all(|name| name.as_str() != "NET_PASS"));
        let params = NetParams::from_store(&store);
        assert_eq!(params.ssid.as_str(), "field-ap");
        assert!(params.is_secured());
    }

    #[test]
    fn test_zero_port_falls_back() {
        let mut store = ParameterStore::new();
        NetParams::register_defaults(&mut store).unwrap();
        store.set("NET_BRIDGE_PORT", ParamValue::Int(0)).unwrap();
        store.set("NET_RADIO_PORT", ParamValue::Int(70_000)).unwrap();

        let params = NetParams::from_store(&store);
        assert_eq!(params.bridge_port, DEFAULT_BRIDGE_PORT);
        assert_eq!(params.radio_port, DEFAULT_RADIO_PORT);
    }
}
