//! PPM pulse train generator
//!
//! Interrupt-driven state machine producing a servo-style PPM frame:
//!
//! ```text
//!  ┌─ ch0 ─────┐┌─ ch1 ─────┐      ┌─ ch7 ─────┐
//!  PULSE  GAP   PULSE  GAP    ...   PULSE  GAP   PULSE  FRAME_FILL
//!  300 µs F0-300 300 µs F1-300      300 µs F7-300 300 µs 22500-ΣF-300
//! ```
//!
//! Each call to [`PpmGenerator::fire`] performs exactly one transition and
//! returns the level to drive now plus the time until the next call. The
//! timer driver is expected to schedule the next firing relative to the
//! previous deadline, never relative to "now".
//!
//! # Design
//!
//! The shared frame is read once per output frame, at the first pulse of
//! channel 0, so a publish landing mid-frame takes effect on the next frame
//! and never mixes two frames on the wire. Channel values are clamped here,
//! at consumption time.

use core::fmt;

use crate::channels::{PulseLimits, CHANNEL_COUNT, MAX_PULSE_US, MIN_PULSE_US};
use crate::parameters::ppm::PpmParams;
use crate::shared::SharedFrame;

/// Default active pulse width (μs)
pub const DEFAULT_PULSE_US: u16 = 300;

/// Default total frame length (μs)
pub const DEFAULT_FRAME_US: u32 = 22_500;

/// Default shortest frame fill (μs)
pub const DEFAULT_MIN_FILL_US: u32 = 400;

/// Which line level marks the active pulse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Pulses drive the line low, idle is high
    ActiveLow,
    /// Pulses drive the line high, idle is low
    ActiveHigh,
}

/// Output line level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinLevel {
    Low,
    High,
}

impl PinLevel {
    pub fn is_high(self) -> bool {
        self == PinLevel::High
    }
}

impl Polarity {
    /// Line level while a pulse is active
    pub fn active(self) -> PinLevel {
        match self {
            Polarity::ActiveLow => PinLevel::Low,
            Polarity::ActiveHigh => PinLevel::High,
        }
    }

    /// Line level between pulses
    pub fn idle(self) -> PinLevel {
        match self {
            Polarity::ActiveLow => PinLevel::High,
            Polarity::ActiveHigh => PinLevel::Low,
        }
    }
}

/// One output transition: drive `level` now, fire again after `hold_us`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub level: PinLevel,
    pub hold_us: u32,
}

/// Pulse train timing configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PpmConfig {
    /// Fixed active pulse width (μs)
    pub pulse_us: u16,
    /// Total frame length (μs)
    pub frame_us: u32,
    /// Shortest frame fill ever emitted (μs)
    pub min_fill_us: u32,
    /// Channel value range applied at consumption time
    pub limits: PulseLimits,
    pub polarity: Polarity,
}

impl Default for PpmConfig {
    fn default() -> Self {
        Self {
            pulse_us: DEFAULT_PULSE_US,
            frame_us: DEFAULT_FRAME_US,
            min_fill_us: DEFAULT_MIN_FILL_US,
            limits: PulseLimits::new(MIN_PULSE_US, MAX_PULSE_US),
            polarity: Polarity::ActiveLow,
        }
    }
}

/// Rejected pulse train configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PpmConfigError {
    /// Minimum channel limit is above the maximum
    InvertedLimits,
    /// Pulse is not shorter than the minimum channel width
    PulseTooWide,
    /// Worst-case frame does not fit the frame length
    FrameTooShort { worst_case_us: u32 },
}

impl fmt::Display for PpmConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PpmConfigError::InvertedLimits => write!(f, "channel limits inverted"),
            PpmConfigError::PulseTooWide => {
                write!(f, "pulse width must be below minimum channel width")
            }
            PpmConfigError::FrameTooShort { worst_case_us } => {
                write!(f, "frame too short for worst case {} us", worst_case_us)
            }
        }
    }
}

impl PpmConfig {
    /// Build configuration from PPM parameters
    pub fn from_params(params: &PpmParams) -> Self {
        Self {
            pulse_us: params.pulse_us,
            frame_us: params.frame_us,
            min_fill_us: params.min_fill_us,
            limits: PulseLimits::new(params.min_us, params.max_us),
            polarity: if params.invert {
                Polarity::ActiveLow
            } else {
                Polarity::ActiveHigh
            },
        }
    }

    /// Longest possible frame before fill saturation kicks in (μs)
    pub fn worst_case_us(&self) -> u32 {
        self.limits.max_us as u32 * CHANNEL_COUNT as u32 + self.pulse_us as u32 + self.min_fill_us
    }

    /// Check that every clamped frame fits the frame length
    pub fn validate(&self) -> Result<(), PpmConfigError> {
        if self.limits.min_us > self.limits.max_us {
            return Err(PpmConfigError::InvertedLimits);
        }
        if self.pulse_us >= self.limits.min_us {
            return Err(PpmConfigError::PulseTooWide);
        }
        let worst_case_us = self.worst_case_us();
        if worst_case_us > self.frame_us {
            return Err(PpmConfigError::FrameTooShort { worst_case_us });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Next firing starts an active pulse
    Pulse,
    /// Next firing ends the active pulse
    Gap,
}

/// Interrupt-owned position within the frame
#[derive(Debug, Clone, Copy)]
struct GeneratorCursor {
    /// Channel whose gap follows the current pulse; `CHANNEL_COUNT` = fill
    channel: usize,
    phase: Phase,
    /// Time spent in the current frame so far (μs)
    elapsed_us: u32,
    /// Overrun of the previous frame subtracted from the next fill (μs)
    debt_us: u32,
}

impl GeneratorCursor {
    const fn start() -> Self {
        Self {
            channel: 0,
            phase: Phase::Pulse,
            elapsed_us: 0,
            debt_us: 0,
        }
    }
}

/// PPM frame state machine, owned exclusively by the timer interrupt
pub struct PpmGenerator {
    config: PpmConfig,
    cursor: GeneratorCursor,
    latched: [u16; CHANNEL_COUNT],
    frames: u32,
}

impl PpmGenerator {
    /// Create a generator positioned at the start of a frame
    ///
    /// The configuration is used as given; call [`PpmConfig::validate`]
    /// beforehand to rule out fill saturation.
    pub fn new(config: PpmConfig) -> Self {
        Self {
            config,
            cursor: GeneratorCursor::start(),
            latched: [config.limits.min_us; CHANNEL_COUNT],
            frames: 0,
        }
    }

    pub fn config(&self) -> &PpmConfig {
        &self.config
    }

    /// Clamped channel values used by the frame being emitted
    pub fn latched(&self) -> &[u16; CHANNEL_COUNT] {
        &self.latched
    }

    /// Completed frames (wrapping)
    pub fn frames_emitted(&self) -> u32 {
        self.frames
    }

    /// Perform one timer-driven transition
    pub fn fire(&mut self, frame: &SharedFrame) -> Edge {
        let pulse_us = self.config.pulse_us as u32;

        match self.cursor.phase {
            Phase::Pulse => {
                if self.cursor.channel == 0 {
                    self.latched = *frame.snapshot().clamped(self.config.limits).values();
                }
                self.cursor.phase = Phase::Gap;
                Edge {
                    level: self.config.polarity.active(),
                    hold_us: pulse_us,
                }
            }
            Phase::Gap => {
                self.cursor.phase = Phase::Pulse;
                let idle = self.config.polarity.idle();

                if self.cursor.channel < CHANNEL_COUNT {
                    let width_us = self.latched[self.cursor.channel] as u32;
                    self.cursor.elapsed_us += width_us;
                    self.cursor.channel += 1;
                    return Edge {
                        level: idle,
                        hold_us: width_us.saturating_sub(pulse_us),
                    };
                }

                // Terminating pulse done, pad the rest of the frame
                let spent_us = self.cursor.elapsed_us + pulse_us + self.cursor.debt_us;
                let hold_us = self
                    .config
                    .frame_us
                    .saturating_sub(spent_us)
                    .max(self.config.min_fill_us);
                self.cursor.debt_us = (spent_us + hold_us)
                    .saturating_sub(self.config.frame_us)
                    .min(self.config.frame_us);
                self.cursor.elapsed_us = 0;
                self.cursor.channel = 0;
                self.frames = self.frames.wrapping_add(1);

                Edge {
                    level: idle,
                    hold_us,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::channels::ChannelFrame;
    use std::vec::Vec;

    /// Edges per frame: (pulse + gap) per channel, terminating pulse, fill
    const EDGES_PER_FRAME: usize = CHANNEL_COUNT * 2 + 2;

    fn one_frame(generator: &mut PpmGenerator, shared: &SharedFrame) -> Vec<Edge> {
        (0..EDGES_PER_FRAME).map(|_| generator.fire(shared)).collect()
    }

    fn edge(level: PinLevel, hold_us: u32) -> Edge {
        Edge { level, hold_us }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(PpmConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_short_frame() {
        let config = PpmConfig {
            frame_us: 15_000,
            ..PpmConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(PpmConfigError::FrameTooShort {
                worst_case_us: 2200 * 8 + 300 + 400
            })
        );
    }

    #[test]
    fn test_validate_rejects_wide_pulse() {
        let config = PpmConfig {
            pulse_us: 800,
            ..PpmConfig::default()
        };
        assert_eq!(config.validate(), Err(PpmConfigError::PulseTooWide));
    }

    #[test]
    fn test_frame_timing_uniform_channels() {
        let shared = SharedFrame::new(ChannelFrame::uniform(1500));
        let mut generator = PpmGenerator::new(PpmConfig::default());

        let edges = one_frame(&mut generator, &shared);

        for ch in 0..CHANNEL_COUNT {
            assert_eq!(edges[ch * 2], edge(PinLevel::Low, 300));
            assert_eq!(edges[ch * 2 + 1], edge(PinLevel::High, 1200));
        }
        assert_eq!(edges[16], edge(PinLevel::Low, 300));
        assert_eq!(edges[17], edge(PinLevel::High, 22_500 - 12_000 - 300));

        let total: u32 = edges.iter().map(|e| e.hold_us).sum();
        assert_eq!(total, 22_500);
        assert_eq!(generator.frames_emitted(), 1);
    }

    #[test]
    fn test_frame_length_constant_for_any_valid_frame() {
        let frames = [
            ChannelFrame::uniform(800),
            ChannelFrame::uniform(2200),
            ChannelFrame::new([800, 2200, 1000, 2000, 1234, 1777, 900, 2100]),
        ];
        let mut generator = PpmGenerator::new(PpmConfig::default());

        for frame in frames {
            let shared = SharedFrame::new(frame);
            let edges = one_frame(&mut generator, &shared);
            let total: u32 = edges.iter().map(|e| e.hold_us).sum();
            assert_eq!(total, 22_500);

            for (ch, &value) in frame.values().iter().enumerate() {
                assert_eq!(edges[ch * 2].hold_us, 300);
                assert_eq!(edges[ch * 2 + 1].hold_us, value as u32 - 300);
            }
        }
    }

    #[test]
    fn test_out_of_range_values_clamped() {
        let shared = SharedFrame::new(ChannelFrame::new([
            50, 9999, 1500, 1500, 1500, 1500, 1500, 1500,
        ]));
        let mut generator = PpmGenerator::new(PpmConfig::default());

        let edges = one_frame(&mut generator, &shared);

        assert_eq!(edges[1].hold_us, 800 - 300);
        assert_eq!(edges[3].hold_us, 2200 - 300);
        assert_eq!(generator.latched()[0], 800);
        assert_eq!(generator.latched()[1], 2200);
        let total: u32 = edges.iter().map(|e| e.hold_us).sum();
        assert_eq!(total, 22_500);
    }

    #[test]
    fn test_publish_mid_frame_applies_next_frame() {
        let shared = SharedFrame::new(ChannelFrame::uniform(1500));
        let mut generator = PpmGenerator::new(PpmConfig::default());

        // Start the frame, then emit a few channels
        let mut edges = Vec::new();
        for _ in 0..5 {
            edges.push(generator.fire(&shared));
        }
        shared.publish(ChannelFrame::uniform(2000));
        for _ in 5..EDGES_PER_FRAME {
            edges.push(generator.fire(&shared));
        }

        // Whole first frame still at 1500
        for ch in 0..CHANNEL_COUNT {
            assert_eq!(edges[ch * 2 + 1].hold_us, 1200);
        }

        let next = one_frame(&mut generator, &shared);
        for ch in 0..CHANNEL_COUNT {
            assert_eq!(next[ch * 2 + 1].hold_us, 1700);
        }
    }

    #[test]
    fn test_same_frame_published_twice_same_output() {
        let shared = SharedFrame::new(ChannelFrame::uniform(1600));
        let mut generator = PpmGenerator::new(PpmConfig::default());
        let first = one_frame(&mut generator, &shared);

        shared.publish(ChannelFrame::uniform(1600));
        shared.publish(ChannelFrame::uniform(1600));
        let second = one_frame(&mut generator, &shared);

        assert_eq!(first, second);
    }

    #[test]
    fn test_fill_saturates_and_debt_is_bounded() {
        // 8 × 2200 + 300 = 17 900 µs, leaving less than the minimum fill
        let config = PpmConfig {
            frame_us: 18_000,
            min_fill_us: 400,
            ..PpmConfig::default()
        };
        let shared = SharedFrame::new(ChannelFrame::uniform(2200));
        let mut generator = PpmGenerator::new(config);

        let edges = one_frame(&mut generator, &shared);
        assert_eq!(edges[17].hold_us, 400);

        // Overrun of 300 µs is carried, the fill stays at its floor
        let edges = one_frame(&mut generator, &shared);
        assert_eq!(edges[17].hold_us, 400);

        // Debt never exceeds one frame length
        for _ in 0..1000 {
            one_frame(&mut generator, &shared);
        }
        assert!(generator.cursor.debt_us <= config.frame_us);
    }

    #[test]
    fn test_debt_recovered_after_overrun() {
        let config = PpmConfig {
            frame_us: 18_000,
            min_fill_us: 400,
            ..PpmConfig::default()
        };
        let shared = SharedFrame::new(ChannelFrame::uniform(2200));
        let mut generator = PpmGenerator::new(config);

        // Runs 300 µs long
        one_frame(&mut generator, &shared);
        assert_eq!(generator.cursor.debt_us, 300);

        // Short frame: fill shortened by the carried debt
        shared.publish(ChannelFrame::uniform(1000));
        let edges = one_frame(&mut generator, &shared);
        assert_eq!(edges[17].hold_us, 18_000 - 8_000 - 300 - 300);
        assert_eq!(generator.cursor.debt_us, 0);
    }

    #[test]
    fn test_active_high_polarity() {
        let config = PpmConfig {
            polarity: Polarity::ActiveHigh,
            ..PpmConfig::default()
        };
        let shared = SharedFrame::new(ChannelFrame::uniform(1500));
        let mut generator = PpmGenerator::new(config);

        let edges = one_frame(&mut generator, &shared);
        assert_eq!(edges[0].level, PinLevel::High);
        assert_eq!(edges[1].level, PinLevel::Low);
    }

    #[test]
    fn test_one_transition_per_fire() {
        let shared = SharedFrame::new(ChannelFrame::uniform(1500));
        let mut generator = PpmGenerator::new(PpmConfig::default());

        // Levels strictly alternate edge by edge
        let edges = one_frame(&mut generator, &shared);
        for pair in edges.windows(2) {
            assert_ne!(pair[0].level, pair[1].level);
        }
    }
}
