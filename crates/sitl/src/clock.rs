//! Wall-clock time source for SITL.

use std::time::Instant;

use rc_bridge_core::traits::Clock;

/// Monotonic clock counting from node start.
///
/// Copies share the same origin, so the radio task, the control loop and the
/// PPM thread agree on timestamps.
#[derive(Debug, Clone, Copy)]
pub struct HostClock {
    origin: Instant,
}

impl HostClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for HostClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for HostClock {
    fn now_us(&self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copies_share_origin() {
        let clock = HostClock::new();
        let copy = clock;
        std::thread::sleep(std::time::Duration::from_millis(2));
        let a = clock.now_ms();
        let b = copy.now_ms();
        assert!(a >= 2);
        assert!(b >= a);
    }
}
