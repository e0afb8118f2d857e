//! Channel frame model
//!
//! A [`ChannelFrame`] is the current best-known set of proportional control
//! values, one pulse width in microseconds per channel. Frames are stored
//! exactly as received; range limiting happens when the pulse generator
//! consumes them (see [`PulseLimits::clamp`]).

/// Number of proportional channels carried by every frame
pub const CHANNEL_COUNT: usize = 8;

/// Shortest pulse width the output hardware accepts (μs)
pub const MIN_PULSE_US: u16 = 800;

/// Longest pulse width the output hardware accepts (μs)
pub const MAX_PULSE_US: u16 = 2200;

/// Pulse width written to every channel when the link is lost (μs)
pub const FAILSAFE_PULSE_US: u16 = 900;

/// Fixed-size set of channel pulse widths (μs)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelFrame {
    values: [u16; CHANNEL_COUNT],
}

impl ChannelFrame {
    /// Frame with every channel at [`FAILSAFE_PULSE_US`]
    pub const FAILSAFE: Self = Self::uniform(FAILSAFE_PULSE_US);

    /// Create a frame from raw channel values
    pub const fn new(values: [u16; CHANNEL_COUNT]) -> Self {
        Self { values }
    }

    /// Create a frame with the same value in every channel
    pub const fn uniform(value_us: u16) -> Self {
        Self {
            values: [value_us; CHANNEL_COUNT],
        }
    }

    /// Raw channel values, unclamped
    pub const fn values(&self) -> &[u16; CHANNEL_COUNT] {
        &self.values
    }

    /// Channel value by 0-based index
    pub fn get(&self, index: usize) -> Option<u16> {
        self.values.get(index).copied()
    }

    /// Returns a copy with every channel clamped to `limits`
    pub fn clamped(&self, limits: PulseLimits) -> Self {
        let mut values = self.values;
        for value in values.iter_mut() {
            *value = limits.clamp(*value);
        }
        Self { values }
    }
}

impl Default for ChannelFrame {
    fn default() -> Self {
        Self::FAILSAFE
    }
}

impl From<[u16; CHANNEL_COUNT]> for ChannelFrame {
    fn from(values: [u16; CHANNEL_COUNT]) -> Self {
        Self::new(values)
    }
}

/// Safe hardware range for channel pulse widths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseLimits {
    /// Minimum pulse width (μs)
    pub min_us: u16,
    /// Maximum pulse width (μs)
    pub max_us: u16,
}

impl PulseLimits {
    pub const fn new(min_us: u16, max_us: u16) -> Self {
        Self { min_us, max_us }
    }

    /// Limit a raw channel value to `[min_us, max_us]`
    pub const fn clamp(&self, value_us: u16) -> u16 {
        if value_us < self.min_us {
            self.min_us
        } else if value_us > self.max_us {
            self.max_us
        } else {
            value_us
        }
    }
}

impl Default for PulseLimits {
    fn default() -> Self {
        Self::new(MIN_PULSE_US, MAX_PULSE_US)
    }
}
