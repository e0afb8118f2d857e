//! Parameter Storage Types
//!
//! Provides the RAM-only `ParameterStore`. Values live for the current power
//! cycle; every boot starts from the registered defaults.

use super::error::ParameterError;
use bitflags::bitflags;
use heapless::index_map::FnvIndexMap;
use heapless::String;

/// Maximum parameter name length
pub const PARAM_NAME_LEN: usize = 16;

/// Maximum number of parameters
pub const MAX_PARAMS: usize = 32;

/// Maximum string parameter length
pub const MAX_STRING_LEN: usize = 63;

bitflags! {
    /// Parameter flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ParamFlags: u8 {
        /// Parameter is left out of listings and the status page
        const HIDDEN = 0b00000001;
        /// Parameter cannot be changed after registration
        const READ_ONLY = 0b00000010;
    }
}

/// Parameter value types
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// String parameter (max 63 chars)
    String(String<MAX_STRING_LEN>),
    /// Boolean parameter
    Bool(bool),
    /// 32-bit signed integer
    Int(i32),
}

impl ParamValue {
    /// Build a string value, truncated to `MAX_STRING_LEN` bytes
    pub fn string(value: &str) -> Self {
        let mut s = String::new();
        for c in value.chars() {
            if s.push(c).is_err() {
                break;
            }
        }
        ParamValue::String(s)
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            ParamValue::Int(v) => Some(*v),
            ParamValue::Bool(v) => Some(*v as i32),
            ParamValue::String(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            ParamValue::Int(v) => Some(*v != 0),
            ParamValue::String(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// Parameter metadata
#[derive(Debug, Clone)]
pub struct ParamMetadata {
    /// Parameter flags
    pub flags: ParamFlags,
}

fn key(name: &str) -> Result<String<PARAM_NAME_LEN>, ParameterError> {
    let mut key = String::<PARAM_NAME_LEN>::new();
    key.push_str(name)
        .map_err(|_| ParameterError::NameTooLong)?;
    Ok(key)
}

/// Parameter store for configuration management
///
/// Stores parameters as key-value pairs with metadata (flags).
pub struct ParameterStore {
    /// Parameter values
    parameters: FnvIndexMap<String<PARAM_NAME_LEN>, ParamValue, MAX_PARAMS>,
    /// Parameter metadata
    metadata: FnvIndexMap<String<PARAM_NAME_LEN>, ParamMetadata, MAX_PARAMS>,
}

impl ParameterStore {
    /// Create a new empty parameter store
    pub fn new() -> Self {
        Self {
            parameters: FnvIndexMap::new(),
            metadata: FnvIndexMap::new(),
        }
    }

    /// Get parameter value
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.parameters.get(&key(name).ok()?)
    }

    /// Integer value of `name`, or `default` if missing or not numeric
    pub fn get_int_or(&self, name: &str, default: i32) -> i32 {
        self.get(name).and_then(ParamValue::as_int).unwrap_or(default)
    }

    /// Boolean value of `name`, or `default` if missing or not boolean
    pub fn get_bool_or(&self, name: &str, default: bool) -> bool {
        self.get(name).and_then(ParamValue::as_bool).unwrap_or(default)
    }

    /// Set parameter value
    pub fn set(&mut self, name: &str, value: ParamValue) -> Result<(), ParameterError> {
        let key = key(name)?;

        if !self.parameters.contains_key(&key) {
            return Err(ParameterError::UnknownParameter);
        }

        if let Some(meta) = self.metadata.get(&key) {
            if meta.flags.contains(ParamFlags::READ_ONLY) {
                return Err(ParameterError::ReadOnly);
            }
        }

        self.parameters.insert(key, value).ok();
        Ok(())
    }

    /// Register a new parameter with default value and flags
    ///
    /// If the parameter already exists, this is a no-op (idempotent).
    pub fn register(
        &mut self,
        name: &str,
        default_value: ParamValue,
        flags: ParamFlags,
    ) -> Result<(), ParameterError> {
        let key = key(name)?;

        if self.parameters.contains_key(&key) {
            // Already exists, don't overwrite
            return Ok(());
        }

        self.parameters
            .insert(key.clone(), default_value)
            .map_err(|_| ParameterError::StoreFull)?;
        self.metadata
            .insert(key, ParamMetadata { flags })
            .map_err(|_| ParameterError::StoreFull)?;
        Ok(())
    }

    /// Check if parameter is hidden
    ///
    /// Hidden parameters (e.g., NET_PASS) never appear in listings.
    pub fn is_hidden(&self, name: &str) -> bool {
        self.get_metadata(name)
            .map(|meta| meta.flags.contains(ParamFlags::HIDDEN))
            .unwrap_or(false)
    }

    /// Get all parameter names (excluding hidden parameters)
    pub fn iter_names(&self) -> impl Iterator<Item = &String<PARAM_NAME_LEN>> {
        self.parameters
            .keys()
            .filter(|name| !self.is_hidden(name.as_str()))
    }

    /// Visible (name, value) pairs in registration order
    pub fn iter_visible(&self) -> impl Iterator<Item = (&String<PARAM_NAME_LEN>, &ParamValue)> {
        self.parameters
            .iter()
            .filter(|(name, _)| !self.is_hidden(name.as_str()))
    }

    /// Get parameter count (excluding hidden parameters)
    pub fn count(&self) -> usize {
        self.iter_names().count()
    }

    /// Get total parameter count (including hidden parameters)
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Get metadata for a parameter by name
    pub fn get_metadata(&self, name: &str) -> Option<&ParamMetadata> {
        self.metadata.get(&key(name).ok()?)
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_store_new() {
        let store = ParameterStore::new();
        assert_eq!(store.count(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_parameter_store_register_and_get() {
        let mut store = ParameterStore::new();
        store
            .register("TEST", ParamValue::Int(42), ParamFlags::empty())
            .unwrap();
        assert_eq!(store.get("TEST"), Some(&ParamValue::Int(42)));
        assert_eq!(store.get_int_or("TEST", 0), 42);
    }

    #[test]
    fn test_parameter_store_set() {
        let mut store = ParameterStore::new();
        store
            .register("TEST", ParamValue::Int(42), ParamFlags::empty())
            .unwrap();
        store.set("TEST", ParamValue::Int(100)).unwrap();
        assert_eq!(store.get("TEST"), Some(&ParamValue::Int(100)));
    }

    #[test]
    fn test_parameter_store_set_unknown() {
        let mut store = ParameterStore::new();
        assert_eq!(
            store.set("UNKNOWN", ParamValue::Int(1)),
            Err(ParameterError::UnknownParameter)
        );
    }

    #[test]
    fn test_parameter_name_too_long() {
        let mut store = ParameterStore::new();
        assert_eq!(
            store.register("A_VERY_LONG_PARAMETER", ParamValue::Int(1), ParamFlags::empty()),
            Err(ParameterError::NameTooLong)
        );
        assert!(store.get("A_VERY_LONG_PARAMETER").is_none());
    }

    #[test]
    fn test_parameter_store_register_idempotent() {
        let mut store = ParameterStore::new();
        store
            .register("TEST", ParamValue::Int(42), ParamFlags::empty())
            .unwrap();
        store.set("TEST", ParamValue::Int(100)).unwrap();
        // Re-register should not overwrite
        store
            .register("TEST", ParamValue::Int(42), ParamFlags::empty())
            .unwrap();
        assert_eq!(store.get("TEST"), Some(&ParamValue::Int(100)));
    }

    #[test]
    fn test_parameter_hidden() {
        let mut store = ParameterStore::new();
        store
            .register("SECRET", ParamValue::string("password"), ParamFlags::HIDDEN)
            .unwrap();
        store
            .register("PUBLIC", ParamValue::Int(1), ParamFlags::empty())
            .unwrap();
        assert!(store.is_hidden("SECRET"));
        assert_eq!(store.count(), 1);
        assert_eq!(store.len(), 2);
        assert!(store.iter_visible().all(|(name, _)| name.as_str() != "SECRET"));
    }

    #[test]
    fn test_parameter_read_only() {
        let mut store = ParameterStore::new();
        store
            .register("READONLY", ParamValue::Int(42), ParamFlags::READ_ONLY)
            .unwrap();
        assert_eq!(
            store.set("READONLY", ParamValue::Int(100)),
            Err(ParameterError::ReadOnly)
        );
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(ParamValue::Bool(true).as_int(), Some(1));
        assert_eq!(ParamValue::Int(0).as_bool(), Some(false));
        assert_eq!(ParamValue::string("abc").as_str(), Some("abc"));
        assert_eq!(ParamValue::string("abc").as_int(), None);
    }

    #[test]
    fn test_string_value_truncated() {
        let bytes = [b'x'; 100];
        let long = core::str::from_utf8(&bytes).unwrap();
        let value = ParamValue::string(long);
        assert_eq!(value.as_str().map(str::len), Some(MAX_STRING_LEN));
    }

    #[test]
    fn test_fallback_on_type_mismatch() {
        let mut store = ParameterStore::new();
        store
            .register("NAME", ParamValue::string("x"), ParamFlags::empty())
            .unwrap();
        assert_eq!(store.get_int_or("NAME", 7), 7);
        assert!(store.get_bool_or("MISSING", true));
    }
}
