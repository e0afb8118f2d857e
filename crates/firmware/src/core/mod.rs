//! Firmware-wide infrastructure
//!
//! Logging macros, the statics shared between execution contexts, and the
//! boot-time configuration built from the parameter store.

pub mod config;
pub mod logging;
pub mod state;
