#![cfg_attr(not(test), no_std)]

//! rc_bridge_firmware - Embassy firmware for the RC link bridge
//!
//! This crate provides the Embassy tasks and RP2350-specific drivers around
//! the pure logic in `rc_bridge_core`.
//!
//! # Design Principles
//!
//! - **Embassy tasks**: Async tasks for the cooperative loop, radio, sessions
//!   and status page
//! - **Interrupt-driven output**: PPM edges come from a hardware alarm, never
//!   from the executor
//! - **Host-testable glue**: Everything outside `platform::rp2350` builds and
//!   tests without the `pico2_w` feature

// Platform abstraction layer
pub mod platform;

// Logging macros, global link state and boot configuration
pub mod core;

// Cooperative loop logic (watchdog + serial bridge)
pub mod subsystems;

// Note: Logging macros (log_info!, log_warn!, log_error!, log_debug!)
// are exported at crate root via #[macro_export] in core::logging
