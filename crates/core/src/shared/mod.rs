//! Cross-context channel state
//!
//! [`SharedFrame`] is the single hand-off point between the radio receive
//! context, the cooperative loop and the pulse timer interrupt. Every access
//! copies the whole frame inside a `critical_section`, so readers never see
//! values from two different publishes. The critical section holds only a
//! fixed-size copy: no allocation, no blocking call.
//!
//! [`LinkFreshness`] is written from the receive context and the
//! cooperative loop, never from the interrupt. Its words are atomics, but
//! [`ControlLink::accept`] and [`ControlLink::expire`] update them in the
//! same critical section as the frame, so the watchdog never judges a frame
//! by a timestamp from before it was published.

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use critical_section::{CriticalSection, Mutex};

use crate::channels::ChannelFrame;

#[derive(Clone, Copy)]
struct Slot {
    frame: ChannelFrame,
    generation: u32,
}

/// Channel frame shared across execution contexts
pub struct SharedFrame {
    slot: Mutex<Cell<Slot>>,
}

impl SharedFrame {
    /// Create a shared frame holding `initial`
    ///
    /// This is a const fn, allowing static initialization.
    pub const fn new(initial: ChannelFrame) -> Self {
        Self {
            slot: Mutex::new(Cell::new(Slot {
                frame: initial,
                generation: 0,
            })),
        }
    }

    /// Replace the whole frame
    pub fn publish(&self, frame: ChannelFrame) {
        critical_section::with(|cs| self.replace(cs, frame));
    }

    /// Replace the whole frame if `condition` holds for the current one
    ///
    /// The check and the replacement happen in the same critical section.
    /// Returns `true` if the frame was replaced.
    pub fn publish_if<F>(&self, frame: ChannelFrame, condition: F) -> bool
    where
        F: FnOnce(&ChannelFrame) -> bool,
    {
        critical_section::with(|cs| self.replace_if(cs, frame, condition))
    }

    fn replace(&self, cs: CriticalSection<'_>, frame: ChannelFrame) {
        let cell = self.slot.borrow(cs);
        let slot = cell.get();
        cell.set(Slot {
            frame,
            generation: slot.generation.wrapping_add(1),
        });
    }

    fn replace_if<F>(&self, cs: CriticalSection<'_>, frame: ChannelFrame, condition: F) -> bool
    where
        F: FnOnce(&ChannelFrame) -> bool,
    {
        if !condition(&self.slot.borrow(cs).get().frame) {
            return false;
        }
        self.replace(cs, frame);
        true
    }

    /// Copy of the current frame
    pub fn snapshot(&self) -> ChannelFrame {
        critical_section::with(|cs| self.slot.borrow(cs).get().frame)
    }

    /// Number of publishes so far (wrapping)
    pub fn generation(&self) -> u32 {
        critical_section::with(|cs| self.slot.borrow(cs).get().generation)
    }
}

/// Recency of the control link
///
/// Timestamps are milliseconds truncated to 32 bits; elapsed time is
/// computed with wrapping arithmetic.
pub struct LinkFreshness {
    last_update_ms: AtomicU32,
    linked: AtomicBool,
}

impl LinkFreshness {
    pub const fn new() -> Self {
        Self {
            last_update_ms: AtomicU32::new(0),
            linked: AtomicBool::new(false),
        }
    }

    /// Record `now_ms` as the last update time
    pub fn stamp(&self, now_ms: u64) {
        self.last_update_ms.store(now_ms as u32, Ordering::Release);
    }

    /// Last update time (truncated milliseconds)
    pub fn last_update_ms(&self) -> u32 {
        self.last_update_ms.load(Ordering::Acquire)
    }

    /// Milliseconds since the last update
    pub fn elapsed_ms(&self, now_ms: u64) -> u32 {
        (now_ms as u32).wrapping_sub(self.last_update_ms())
    }

    pub fn set_linked(&self, linked: bool) {
        self.linked.store(linked, Ordering::Release);
    }

    /// Whether a valid frame arrived since the last failsafe
    pub fn is_linked(&self) -> bool {
        self.linked.load(Ordering::Acquire)
    }
}

impl Default for LinkFreshness {
    fn default() -> Self {
        Self::new()
    }
}

/// Receive counters, updated from the receive context
pub struct LinkStats {
    accepted: AtomicU32,
    rejected: AtomicU32,
}

impl LinkStats {
    pub const fn new() -> Self {
        Self {
            accepted: AtomicU32::new(0),
            rejected: AtomicU32::new(0),
        }
    }

    pub fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn accepted(&self) -> u32 {
        self.accepted.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u32 {
        self.rejected.load(Ordering::Relaxed)
    }
}

impl Default for LinkStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the receiver, watchdog and generator share
pub struct ControlLink {
    frame: SharedFrame,
    freshness: LinkFreshness,
    stats: LinkStats,
}

impl ControlLink {
    /// Create link state with `initial` in the shared frame
    pub const fn new(initial: ChannelFrame) -> Self {
        Self {
            frame: SharedFrame::new(initial),
            freshness: LinkFreshness::new(),
            stats: LinkStats::new(),
        }
    }

    pub fn frame(&self) -> &SharedFrame {
        &self.frame
    }

    pub fn freshness(&self) -> &LinkFreshness {
        &self.freshness
    }

    pub fn stats(&self) -> &LinkStats {
        &self.stats
    }

    /// Publish a received frame and mark the link fresh at `now_ms`
    pub fn accept(&self, frame: ChannelFrame, now_ms: u64) {
        critical_section::with(|cs| {
            self.frame.replace(cs, frame);
            self.freshness.stamp(now_ms);
            self.freshness.set_linked(true);
        });
    }

    /// Take the link down if nothing was accepted for more than `timeout_ms`
    ///
    /// Publishes `failsafe` unless the frame already holds it, then re-stamps
    /// freshness to `now_ms` and clears the linked flag. A link that is
    /// already down and holding `failsafe` is left alone. Returns `true` if
    /// the link went down with this call.
    pub fn expire(&self, failsafe: ChannelFrame, timeout_ms: u32, now_ms: u64) -> bool {
        critical_section::with(|cs| {
            if self.freshness.elapsed_ms(now_ms) <= timeout_ms {
                return false;
            }
            let forced = self.frame.replace_if(cs, failsafe, |current| *current != failsafe);
            if !forced && !self.freshness.is_linked() {
                return false;
            }
            self.freshness.stamp(now_ms);
            self.freshness.set_linked(false);
            true
        })
    }
}

impl Default for ControlLink {
    fn default() -> Self {
        Self::new(ChannelFrame::FAILSAFE)
    }
}
