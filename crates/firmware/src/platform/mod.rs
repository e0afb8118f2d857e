//! Platform abstraction layer
//!
//! All chip-specific code is isolated in [`rp2350`], which only builds with
//! the `pico2_w` feature. Everything else here compiles on host.

pub mod error;

#[cfg(feature = "embassy")]
pub mod time;

#[cfg(feature = "pico2_w")]
pub mod rp2350;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export commonly used types
pub use error::{PlatformError, Result};
#[cfg(feature = "embassy")]
pub use time::EmbassyClock;
