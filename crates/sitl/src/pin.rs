//! PPM output capture for SITL.
//!
//! There is no GPIO on the host, so the generator's edges are recorded and
//! decoded back into channel values. A slot is one active pulse plus the
//! idle time after it; a slot longer than the largest channel value is the
//! frame sync (terminating pulse plus fill).

use rc_bridge_core::channels::CHANNEL_COUNT;
use rc_bridge_core::ppm::{Edge, PinLevel, PpmConfig, PpmGenerator};
use rc_bridge_core::shared::SharedFrame;

/// One frame reconstructed from the pulse train.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedFrame {
    /// Slot length per channel (pulse + gap), i.e. the transmitted value.
    pub channels_us: [u16; CHANNEL_COUNT],
    /// Idle time after each channel pulse.
    pub gaps_us: [u32; CHANNEL_COUNT],
    /// Active pulses seen, including the terminating one.
    pub pulses: usize,
    /// Start of channel 0 to start of the next frame.
    pub period_us: u32,
}

/// Incremental edge decoder.
///
/// Assumes the first edge it sees starts a frame, which holds when it is fed
/// from a freshly created generator. A frame with the wrong number of slots
/// is counted in [`discarded`](Self::discarded) and not returned.
#[derive(Debug)]
pub struct PulseDecoder {
    active: PinLevel,
    sync_threshold_us: u32,
    pending_pulse: Option<u32>,
    slots: Vec<(u32, u32)>,
    discarded: u32,
}

impl PulseDecoder {
    pub fn new(config: &PpmConfig) -> Self {
        Self {
            active: config.polarity.active(),
            sync_threshold_us: u32::from(config.limits.max_us),
            pending_pulse: None,
            slots: Vec::with_capacity(CHANNEL_COUNT),
            discarded: 0,
        }
    }

    pub fn discarded(&self) -> u32 {
        self.discarded
    }

    /// Feed one edge, returning a frame when its sync slot completes.
    pub fn push(&mut self, edge: Edge) -> Option<DecodedFrame> {
        if edge.level == self.active {
            self.pending_pulse = Some(edge.hold_us);
            return None;
        }

        let pulse = self.pending_pulse.take()?;
        let slot = pulse + edge.hold_us;
        if slot <= self.sync_threshold_us {
            self.slots.push((pulse, edge.hold_us));
            return None;
        }

        let slots = std::mem::take(&mut self.slots);
        if slots.len() != CHANNEL_COUNT {
            self.discarded += 1;
            return None;
        }

        let mut frame = DecodedFrame {
            channels_us: [0; CHANNEL_COUNT],
            gaps_us: [0; CHANNEL_COUNT],
            pulses: slots.len() + 1,
            period_us: slot,
        };
        for (i, (pulse, gap)) in slots.into_iter().enumerate() {
            frame.channels_us[i] = (pulse + gap) as u16;
            frame.gaps_us[i] = gap;
            frame.period_us += pulse + gap;
        }
        Some(frame)
    }
}

/// Recorded edge sequence.
#[derive(Debug, Default, Clone)]
pub struct PulseTrace {
    edges: Vec<Edge>,
}

impl PulseTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Total time covered by the recorded edges.
    pub fn duration_us(&self) -> u64 {
        self.edges.iter().map(|e| u64::from(e.hold_us)).sum()
    }

    /// Decode every complete frame in the trace.
    pub fn decode(&self, config: &PpmConfig) -> Vec<DecodedFrame> {
        let mut decoder = PulseDecoder::new(config);
        self.edges.iter().filter_map(|e| decoder.push(*e)).collect()
    }

    /// Fire `generator` until `frames` complete frames have been emitted.
    ///
    /// Edges are recorded without real-time delays.
    pub fn capture(generator: &mut PpmGenerator, shared: &SharedFrame, frames: usize) -> Self {
        let edges_per_frame = 2 * (CHANNEL_COUNT + 1);
        let mut trace = Self::new();
        for _ in 0..frames * edges_per_frame {
            trace.record(generator.fire(shared));
        }
        trace
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rc_bridge_core::channels::ChannelFrame;

    #[test]
    fn test_decode_uniform_frame() {
        let config = PpmConfig::default();
        let shared = SharedFrame::new(ChannelFrame::uniform(1500));
        let mut generator = PpmGenerator::new(config);

        let trace = PulseTrace::capture(&mut generator, &shared, 3);
        let frames = trace.decode(&config);

        assert_eq!(frames.len(), 3);
        for frame in frames {
            assert_eq!(frame.pulses, CHANNEL_COUNT + 1);
            assert_eq!(frame.gaps_us, [1200; CHANNEL_COUNT]);
            assert_eq!(frame.channels_us, [1500; CHANNEL_COUNT]);
            assert_eq!(frame.period_us, 22_500);
        }
        assert_eq!(trace.duration_us(), 3 * 22_500);
    }

    #[test]
    fn test_decode_clamped_values() {
        let config = PpmConfig::default();
        let pulses = [50, 9999, 1000, 1100, 1200, 1300, 1400, 1500];
        let shared = SharedFrame::new(ChannelFrame::new(pulses));
        let mut generator = PpmGenerator::new(config);

        let frames = PulseTrace::capture(&mut generator, &shared, 1).decode(&config);
        assert_eq!(
            frames[0].channels_us,
            [800, 2200, 1000, 1100, 1200, 1300, 1400, 1500]
        );
    }

    #[test]
    fn test_partial_frame_discarded() {
        let config = PpmConfig::default();
        let shared = SharedFrame::new(ChannelFrame::uniform(1500));
        let mut generator = PpmGenerator::new(config);
        let trace = PulseTrace::capture(&mut generator, &shared, 2);

        // Start mid-frame: skip the first three channel slots
        let mut decoder = PulseDecoder::new(&config);
        let frames: Vec<_> = trace.edges()[6..]
            .iter()
            .filter_map(|e| decoder.push(*e))
            .collect();
        assert_eq!(frames.len(), 1);
        assert_eq!(decoder.discarded(), 1);
    }
}
