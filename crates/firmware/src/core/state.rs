//! State shared between execution contexts
//!
//! - [`LINK`]: written by the radio task and the cooperative loop, read by
//!   the PPM alarm interrupt
//! - [`PPM_FRAMES`]: written by the PPM alarm interrupt
//! - [`STATUS`]: written by the cooperative loop, read by the status page

use core::cell::Cell;
use core::sync::atomic::{AtomicU32, Ordering};

use critical_section::Mutex;
use rc_bridge_core::channels::ChannelFrame;
use rc_bridge_core::status::StatusReport;

/// Control link between receiver, watchdog and pulse generator
pub static LINK: rc_bridge_core::shared::ControlLink =
    rc_bridge_core::shared::ControlLink::new(ChannelFrame::FAILSAFE);

/// Completed PPM frames, mirrored from the generator after every edge
pub static PPM_FRAMES: AtomicU32 = AtomicU32::new(0);

/// Latest status snapshot
pub static STATUS: StatusBoard = StatusBoard::new();

/// Read a PPM frame count published from interrupt context
pub fn ppm_frames() -> u32 {
    PPM_FRAMES.load(Ordering::Relaxed)
}

/// Single-slot mailbox for the most recent [`StatusReport`]
pub struct StatusBoard {
    slot: Mutex<Cell<Option<StatusReport>>>,
}

impl StatusBoard {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Cell::new(None)),
        }
    }

    pub fn publish(&self, report: StatusReport) {
        critical_section::with(|cs| self.slot.borrow(cs).set(Some(report)));
    }

    /// Most recent report, `None` before the loop's first iteration
    pub fn latest(&self) -> Option<StatusReport> {
        critical_section::with(|cs| self.slot.borrow(cs).get())
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rc_bridge_core::failsafe::LinkState;
    use rc_bridge_core::shared::ControlLink;

    #[test]
    fn test_status_board_empty_until_published() {
        let board = StatusBoard::new();
        assert!(board.latest().is_none());

        let link = ControlLink::default();
        let report = StatusReport::capture(&link, LinkState::Failsafe, 0, false, 0);
        board.publish(report);
        assert_eq!(board.latest(), Some(report));
    }

    #[test]
    fn test_global_link_starts_at_failsafe() {
        assert_eq!(LINK.frame().snapshot(), ChannelFrame::FAILSAFE);
    }
}
