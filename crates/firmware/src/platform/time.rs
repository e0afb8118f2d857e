//! Embassy-based clock implementation.

use rc_bridge_core::traits::Clock;

/// Clock backed by the Embassy time driver
///
/// # Example
///
/// ```ignore
/// use rc_bridge_firmware::platform::EmbassyClock;
/// use rc_bridge_core::traits::Clock;
///
/// let now = EmbassyClock.now_ms();
/// ```
#[derive(Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_us(&self) -> u64 {
        embassy_time::Instant::now().as_micros()
    }

    fn now_ms(&self) -> u64 {
        embassy_time::Instant::now().as_millis()
    }
}
