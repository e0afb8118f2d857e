//! Platform service traits
//!
//! Trait definitions carry no feature gates. Mock implementations are always
//! available for host testing; real implementations live in the firmware and
//! sitl crates.

pub mod time;

pub use time::{Clock, MockClock};
