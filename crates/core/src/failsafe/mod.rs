//! Control link failsafe watchdog
//!
//! Forces the shared frame to the failsafe frame when no valid control
//! payload has arrived within the timeout, and holds it there until the
//! receiver publishes a fresh frame.
//!
//! The forced publish also re-stamps link freshness, so a persistently dead
//! link costs at most one critical section per timeout window. A link whose
//! last frame already equals the failsafe frame still goes down on timeout,
//! it just needs no publish.
//!
//! Pure logic with no async or embassy dependencies. Called once per
//! cooperative loop iteration.

use crate::channels::ChannelFrame;
use crate::parameters::failsafe::FailsafeParams;
use crate::shared::ControlLink;

/// Default link timeout (ms)
pub const DEFAULT_LINK_TIMEOUT_MS: u32 = 500;

/// Logical link state as seen by the watchdog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Output tracks the latest received frame
    Linked,
    /// Output forced to the failsafe frame
    Failsafe,
}

/// Transition reported by [`FailsafeWatchdog::poll`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogEvent {
    /// Failsafe frame published after `silent_ms` without a valid frame
    Engaged { silent_ms: u32 },
    /// A valid frame arrived after failsafe
    Restored,
}

/// Watchdog configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailsafeConfig {
    /// Time without a valid frame before failsafe engages (ms)
    pub timeout_ms: u32,
    /// Frame published on timeout
    pub frame: ChannelFrame,
}

impl Default for FailsafeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_LINK_TIMEOUT_MS,
            frame: ChannelFrame::FAILSAFE,
        }
    }
}

impl FailsafeConfig {
    /// Build config from FailsafeParams
    pub fn from_params(params: &FailsafeParams) -> Self {
        Self {
            timeout_ms: params.timeout_ms,
            frame: ChannelFrame::uniform(params.pulse_us),
        }
    }
}

/// Stateful link watchdog
pub struct FailsafeWatchdog {
    config: FailsafeConfig,
    state: LinkState,
    /// Number of times failsafe engaged
    trips: u32,
}

impl FailsafeWatchdog {
    /// Create a watchdog in `Failsafe` state
    ///
    /// The link starts out holding the failsafe frame until the first valid
    /// payload arrives.
    pub fn new(config: FailsafeConfig) -> Self {
        Self {
            config,
            state: LinkState::Failsafe,
            trips: 0,
        }
    }

    pub fn config(&self) -> &FailsafeConfig {
        &self.config
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn trips(&self) -> u32 {
        self.trips
    }

    /// Check link recency
    ///
    /// Returns `Some(event)` on a state transition, `None` otherwise.
    pub fn poll(&mut self, link: &ControlLink, now_ms: u64) -> Option<WatchdogEvent> {
        let freshness = link.freshness();
        let silent_ms = freshness.elapsed_ms(now_ms);
        let timeout_ms = self.config.timeout_ms;

        // Re-checked under the critical section: a frame arriving from the
        // receive context after the freshness read must not be overwritten.
        if silent_ms > timeout_ms && link.expire(self.config.frame, timeout_ms, now_ms) {
            self.state = LinkState::Failsafe;
            self.trips = self.trips.wrapping_add(1);
            return Some(WatchdogEvent::Engaged { silent_ms });
        }

        if self.state == LinkState::Failsafe && freshness.is_linked() {
            self.state = LinkState::Linked;
            return Some(WatchdogEvent::Restored);
        }

        None
    }
}
