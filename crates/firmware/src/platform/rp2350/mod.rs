//! RP2350 platform implementation (Pico 2 W)
//!
//! - [`ppm_timer`]: PPM output driven from TIMER0 alarm 2
//! - [`network`]: CYW43439 soft-AP and embassy-net stack
//! - [`radio`]: UDP control frame receiver
//! - [`session`]: TCP socket sessions for the serial bridge
//! - [`status_page`]: HTTP status page
//! - [`tasks`]: cooperative control loop

pub mod network;
pub mod ppm_timer;
pub mod radio;
pub mod session;
pub mod status_page;
pub mod tasks;

pub use network::{wait_network_ready, ApConfig};
pub use session::{SessionRouter, INBOUND};
