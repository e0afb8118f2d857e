//! RP2350 Embassy tasks
//!
//! Network-facing tasks live next to their sockets ([`super::radio`],
//! [`super::session`], [`super::status_page`]). This module holds the
//! cooperative control loop.

pub mod control;

pub use control::control_loop_task;
