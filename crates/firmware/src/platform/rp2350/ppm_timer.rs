//! PPM output on TIMER0 alarm 2
//!
//! The embassy time driver owns alarm 0. Alarm 2 is reprogrammed from its own
//! interrupt after every edge, so jitter never accumulates: each deadline is
//! derived from the previous deadline, not from the time the handler ran.
//!
//! The binary defines the `TIMER0_IRQ_2` handler and calls [`on_alarm`].

use core::cell::RefCell;
use core::sync::atomic::Ordering;

use critical_section::Mutex;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::interrupt::{self, InterruptExt, Priority};
use embassy_rp::pac;
use rc_bridge_core::ppm::{PinLevel, PpmConfig, PpmGenerator};

use crate::core::state::{LINK, PPM_FRAMES};
use crate::platform::error::{PlatformError, TimerError};

const ALARM: usize = 2;

/// Delay between start and the first pulse (μs)
const START_DELAY_US: u32 = 1_000;

/// Minimum distance between now and a newly armed deadline (μs)
const MIN_LEAD_US: u32 = 5;

struct PpmDriver {
    generator: PpmGenerator,
    pin: Output<'static>,
    deadline: u32,
}

static DRIVER: Mutex<RefCell<Option<PpmDriver>>> = Mutex::new(RefCell::new(None));

fn level(level: PinLevel) -> Level {
    match level {
        PinLevel::High => Level::High,
        PinLevel::Low => Level::Low,
    }
}

fn now_us() -> u32 {
    pac::TIMER0.timerawl().read()
}

/// Arm the alarm for `deadline`, pushed out if it is already too close
fn arm(deadline: u32) -> u32 {
    let now = now_us();
    let deadline = if (deadline.wrapping_sub(now) as i32) < MIN_LEAD_US as i32 {
        now.wrapping_add(MIN_LEAD_US)
    } else {
        deadline
    };
    pac::TIMER0.alarm(ALARM).write_value(deadline);
    deadline
}

/// Start the pulse train on `pin`
///
/// The line is driven to idle immediately; the first pulse follows after
/// `START_DELAY_US`.
pub fn start(config: PpmConfig, mut pin: Output<'static>) -> crate::platform::Result<()> {
    critical_section::with(|cs| {
        let mut slot = DRIVER.borrow_ref_mut(cs);
        if slot.is_some() {
            return Err(PlatformError::from(TimerError::AlreadyStarted));
        }

        pin.set_level(level(config.polarity.idle()));
        let deadline = now_us().wrapping_add(START_DELAY_US);
        *slot = Some(PpmDriver {
            generator: PpmGenerator::new(config),
            pin,
            deadline,
        });

        pac::TIMER0.intr().write(|w| w.set_alarm(ALARM, true));
        pac::TIMER0.inte().modify(|w| w.set_alarm(ALARM, true));
        arm(deadline);
        Ok(())
    })?;

    interrupt::TIMER0_IRQ_2.set_priority(Priority::P0);
    // SAFETY: the handler only touches DRIVER and LINK, both behind critical sections
    unsafe { interrupt::TIMER0_IRQ_2.enable() };

    crate::log_info!(
        "PPM output started ({} us frame, {} us pulse)",
        config.frame_us,
        config.pulse_us
    );
    Ok(())
}

/// Alarm interrupt body: emit one edge and arm the next deadline
pub fn on_alarm() {
    pac::TIMER0.intr().write(|w| w.set_alarm(ALARM, true));

    critical_section::with(|cs| {
        let mut slot = DRIVER.borrow_ref_mut(cs);
        let Some(driver) = slot.as_mut() else {
            return;
        };

        let edge = driver.generator.fire(LINK.frame());
        driver.pin.set_level(level(edge.level));
        driver.deadline = arm(driver.deadline.wrapping_add(edge.hold_us));
        PPM_FRAMES.store(driver.generator.frames_emitted(), Ordering::Relaxed);
    });
}
