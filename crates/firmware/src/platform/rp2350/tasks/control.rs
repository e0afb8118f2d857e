//! Cooperative control loop task
//!
//! Each tick (default 10 ms):
//!
//! - apply queued session notifications to the serial bridge
//! - run one [`LinkLoop`] step: failsafe watchdog, then serial to session
//! - publish a status snapshot for the status page
//!
//! Session payloads are written with the async UART path, so a full TX
//! buffer yields to the other tasks. The tick still waits for the write to
//! finish, which at 115200 baud is about 87 us per byte.

use embassy_rp::uart::BufferedUart;
use embassy_time::{Duration, Ticker};
use rc_bridge_core::failsafe::FailsafeConfig;
use rc_bridge_core::traits::Clock;

use crate::core::state::{ppm_frames, LINK, STATUS};
use crate::platform::rp2350::session::{SessionRouter, INBOUND};
use crate::platform::EmbassyClock;
use crate::subsystems::LinkLoop;

/// Loop period
pub const LOOP_PERIOD_MS: u64 = 10;

#[embassy_executor::task]
pub async fn control_loop_task(mut uart: BufferedUart, failsafe: FailsafeConfig) {
    crate::log_info!(
        "Control loop started ({} ms period, {} ms link timeout)",
        LOOP_PERIOD_MS,
        failsafe.timeout_ms
    );

    let mut link_loop: LinkLoop = LinkLoop::new(failsafe);
    let mut router = SessionRouter;
    let clock = EmbassyClock;
    let mut ticker = Ticker::every(Duration::from_millis(LOOP_PERIOD_MS));

    loop {
        while let Ok(message) = INBOUND.try_receive() {
            link_loop
                .forward_session_event(&mut uart, message.as_event())
                .await;
        }

        link_loop.step(&LINK, &mut uart, &mut router, clock.now_ms());
        STATUS.publish(link_loop.status(&LINK, ppm_frames()));

        ticker.next().await;
    }
}
