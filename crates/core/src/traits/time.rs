//! Monotonic clock abstraction
//!
//! The watchdog and receiver take plain millisecond timestamps. [`Clock`]
//! is how the cooperative loop and the receive callback obtain them without
//! naming a concrete timer.

use core::cell::Cell;

/// Monotonic time since boot
///
/// # Example
///
/// ```
/// use rc_bridge_core::traits::{Clock, MockClock};
///
/// fn silent_for<C: Clock>(clock: &C, last_ms: u64) -> u64 {
///     clock.now_ms().saturating_sub(last_ms)
/// }
///
/// let clock = MockClock::with_initial_ms(1_200);
/// assert_eq!(silent_for(&clock, 700), 500);
/// ```
pub trait Clock {
    /// Microseconds since boot
    fn now_us(&self) -> u64;

    /// Milliseconds since boot
    fn now_ms(&self) -> u64 {
        self.now_us() / 1000
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_us(&self) -> u64 {
        (**self).now_us()
    }
}

/// Manually advanced clock for deterministic tests
///
/// Single-threaded: time only moves when the test says so.
#[derive(Debug, Default)]
pub struct MockClock {
    current_us: Cell<u64>,
}

impl MockClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_ms(ms: u64) -> Self {
        Self {
            current_us: Cell::new(ms * 1000),
        }
    }

    /// Jump to an absolute time
    pub fn set_us(&self, us: u64) {
        self.current_us.set(us);
    }

    pub fn advance_us(&self, us: u64) {
        self.current_us.set(self.current_us.get().saturating_add(us));
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance_us(ms.saturating_mul(1000));
    }
}

impl Clock for MockClock {
    fn now_us(&self) -> u64 {
        self.current_us.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_clock_starts_at_zero() {
        let clock = MockClock::new();
        assert_eq!(clock.now_us(), 0);
        assert_eq!(clock.now_ms(), 0);
    }

    #[test]
    fn mock_clock_advance() {
        let clock = MockClock::with_initial_ms(5);
        clock.advance_us(1_500);
        assert_eq!(clock.now_us(), 6_500);
        assert_eq!(clock.now_ms(), 6);

        clock.advance_ms(600);
        assert_eq!(clock.now_ms(), 606);
    }

    #[test]
    fn mock_clock_set_and_ms_rounds_down() {
        let clock = MockClock::new();
        clock.set_us(1_999);
        assert_eq!(clock.now_ms(), 1);
        clock.set_us(2_000);
        assert_eq!(clock.now_ms(), 2);
    }

    #[test]
    fn clock_through_reference() {
        let clock = MockClock::with_initial_ms(42);
        let by_ref = &clock;
        assert_eq!(Clock::now_ms(&by_ref), 42);
    }
}
