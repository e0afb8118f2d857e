//! Cooperative loop body
//!
//! One iteration runs the failsafe watchdog and one opportunistic step of the
//! serial bridge. Session layer notifications are applied between
//! iterations through [`LinkLoop::handle_session_event`], or through
//! [`LinkLoop::forward_session_event`] when the UART has an async write
//! side that can wait for TX space without blocking the executor.
//!
//! Errors from either side are logged and swallowed: the loop must keep
//! iterating so the watchdog keeps running.

use embedded_io::{Error as _, Read, ReadReady, Write};
use rc_bridge_core::bridge::{
    BridgeError, BridgeStats, SerialBridge, SessionEvent, SessionTransport, DEFAULT_BRIDGE_BUFFER,
};
use rc_bridge_core::failsafe::{FailsafeConfig, FailsafeWatchdog, LinkState, WatchdogEvent};
use rc_bridge_core::shared::ControlLink;
use rc_bridge_core::status::StatusReport;

use crate::platform::PlatformError;

/// Watchdog and serial bridge owned by the cooperative loop
pub struct LinkLoop<const N: usize = DEFAULT_BRIDGE_BUFFER> {
    watchdog: FailsafeWatchdog,
    bridge: SerialBridge<N>,
}

impl<const N: usize> LinkLoop<N> {
    pub fn new(failsafe: FailsafeConfig) -> Self {
        Self {
            watchdog: FailsafeWatchdog::new(failsafe),
            bridge: SerialBridge::new(),
        }
    }

    pub fn link_state(&self) -> LinkState {
        self.watchdog.state()
    }

    pub fn bridge_stats(&self) -> BridgeStats {
        self.bridge.stats()
    }

    pub fn session_active(&self) -> bool {
        self.bridge.is_session_active()
    }

    /// Apply one session layer notification
    pub fn handle_session_event<S: Write>(&mut self, serial: &mut S, event: SessionEvent<'_>) {
        match event {
            SessionEvent::Connected(id) => {
                if let Some(previous) = self.bridge.active_session() {
                    crate::log_info!("Session {} replaces session {}", id, previous);
                } else {
                    crate::log_info!("Session {} connected", id);
                }
            }
            SessionEvent::Disconnected(id) => {
                crate::log_info!("Session {} disconnected", id);
            }
            SessionEvent::Binary(..) => {}
        }

        if let Err(e) = self.bridge.handle_event(serial, event) {
            crate::log_warn!("Session to serial failed: {:?}", PlatformError::from(e));
        }
    }

    /// Apply one session layer notification, awaiting UART TX space
    ///
    /// Same as [`handle_session_event`](Self::handle_session_event) except
    /// that binary payloads go through the async write path. A full TX
    /// buffer then suspends this task instead of spinning in place.
    pub async fn forward_session_event<S>(&mut self, serial: &mut S, event: SessionEvent<'_>)
    where
        S: Write + embedded_io_async::Write,
    {
        let data = match event {
            SessionEvent::Binary(_, data) => data,
            _ => return self.handle_session_event(serial, event),
        };
        if data.is_empty() {
            return;
        }

        match embedded_io_async::Write::write_all(serial, data).await {
            Ok(()) => self.bridge.record_session_to_serial(data.len()),
            Err(e) => {
                let error = PlatformError::from(BridgeError::Serial(e.kind()));
                crate::log_warn!("Session to serial failed: {:?}", error);
            }
        }
    }

    /// Run one loop iteration at `now_ms`
    ///
    /// Returns the watchdog transition, if any.
    pub fn step<S, T>(
        &mut self,
        link: &ControlLink,
        serial: &mut S,
        transport: &mut T,
        now_ms: u64,
    ) -> Option<WatchdogEvent>
    where
        S: Read + ReadReady,
        T: SessionTransport,
    {
        let event = self.watchdog.poll(link, now_ms);
        match event {
            Some(WatchdogEvent::Engaged { silent_ms }) => {
                crate::log_warn!(
                    "No control frame for {} ms, failsafe engaged (trip {})",
                    silent_ms,
                    self.watchdog.trips()
                );
            }
            Some(WatchdogEvent::Restored) => {
                crate::log_info!("Control link established");
            }
            None => {}
        }

        if let Err(e) = self.bridge.poll(serial, transport) {
            crate::log_warn!("Serial to session failed: {:?}", PlatformError::from(e));
        }

        event
    }

    /// Snapshot for the status page
    pub fn status(&self, link: &ControlLink, ppm_frames: u32) -> StatusReport {
        StatusReport::capture(
            link,
            self.watchdog.state(),
            self.watchdog.trips(),
            self.bridge.is_session_active(),
            ppm_frames,
        )
    }
}
