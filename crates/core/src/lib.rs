//! rc_bridge_core - Pure no_std logic for the RC link bridge
//!
//! This crate contains the platform-agnostic pieces of the bridge that can
//! be tested on host without any feature flags or embassy dependencies.
//!
//! # Design Principles
//!
//! - **Zero cfg**: No `#[cfg(feature = ...)]` directives allowed
//! - **Pure no_std**: No std library dependencies
//! - **Trait abstractions**: Serial, session and time services injected via traits
//!
//! # Modules
//!
//! - [`channels`]: Channel frame and pulse width limits
//! - [`protocol`]: Control payload codec
//! - [`shared`]: Cross-context frame buffer and link freshness
//! - [`receiver`]: Receive-callback handler for control payloads
//! - [`ppm`]: Interrupt-driven PPM pulse train state machine
//! - [`failsafe`]: Link timeout watchdog
//! - [`bridge`]: Serial / socket byte bridge
//! - [`status`]: Status snapshot and page rendering
//! - [`parameters`]: RAM-only parameter store and parameter groups
//! - [`traits`]: Platform-agnostic clock abstraction

#![no_std]

pub mod bridge;
pub mod channels;
pub mod failsafe;
pub mod parameters;
pub mod ppm;
pub mod protocol;
pub mod receiver;
pub mod shared;
pub mod status;
pub mod traits;
