//! Cooperative loop subsystems
//!
//! Logic that runs once per loop iteration, kept free of Embassy so it can
//! be driven by host tests with mock serial and session layers.

pub mod link_loop;

pub use link_loop::LinkLoop;
