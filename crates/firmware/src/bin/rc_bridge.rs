//! RC link bridge firmware for the Raspberry Pi Pico 2 W
//!
//! # Hardware Setup
//!
//! - GPIO16: PPM output to the flight controller (active low by default)
//! - GPIO0 / GPIO1: UART0 TX / RX to the flight controller telemetry port
//! - CYW43439: soft-AP at 192.168.4.1/24
//!
//! # Network
//!
//! | port | proto | use |
//! |------|-------|-----|
//! | 4210 | UDP | control frames from the transmitter |
//! | 8888 | TCP | serial bridge session |
//! | 80   | TCP | status page |
//!
//! # Usage
//!
//! ```bash
//! AP_SSID=my-rc AP_PASSWORD=secret123 \
//!   cargo build --release -p rc_bridge_firmware --features pico2_w \
//!   --target thumbv8m.main-none-eabihf
//! probe-rs run --chip RP2350 target/thumbv8m.main-none-eabihf/release/rc_bridge
//! ```

#![no_std]
#![no_main]

use embassy_executor::Spawner;
use embassy_rp as hal;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::interrupt;
use rc_bridge_firmware::core::config::{default_store, BridgeConfig};
use rc_bridge_firmware::platform::rp2350::network::{ap_init_task, wait_network_ready, ApConfig};
use rc_bridge_firmware::platform::rp2350::ppm_timer;
use rc_bridge_firmware::platform::rp2350::radio::radio_task;
use rc_bridge_firmware::platform::rp2350::session::{session_task, MAX_SESSIONS};
use rc_bridge_firmware::platform::rp2350::status_page::status_task;
use rc_bridge_firmware::platform::rp2350::tasks::control_loop_task;
use rc_bridge_firmware::platform::PlatformError;
use static_cell::StaticCell;

use {defmt_rtt as _, panic_probe as _};

hal::bind_interrupts!(struct Irqs {
    UART0_IRQ => embassy_rp::uart::BufferedInterruptHandler<hal::peripherals::UART0>;
});

#[interrupt]
unsafe fn TIMER0_IRQ_2() {
    ppm_timer::on_alarm();
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    rc_bridge_firmware::log_info!("rc-bridge starting");

    let config = match default_store() {
        Ok(store) => BridgeConfig::load(&store),
        Err(e) => {
            rc_bridge_firmware::log_error!("Parameter store: {:?}", PlatformError::from(e));
            BridgeConfig::defaults()
        }
    };

    // PPM output first: the flight controller sees failsafe values from boot
    let ppm_pin = Output::new(p.PIN_16, Level::High);
    if let Err(e) = ppm_timer::start(config.ppm, ppm_pin) {
        rc_bridge_firmware::log_error!("PPM output failed to start: {:?}", e);
    }

    let mut uart_config = embassy_rp::uart::Config::default();
    uart_config.baudrate = config.serial.baud_rate;

    static UART0_TX_BUF: StaticCell<[u8; 1024]> = StaticCell::new();
    static UART0_RX_BUF: StaticCell<[u8; 1024]> = StaticCell::new();

    let uart0 = embassy_rp::uart::BufferedUart::new(
        p.UART0,
        p.PIN_0, // TX (GPIO 0)
        p.PIN_1, // RX (GPIO 1)
        Irqs,
        UART0_TX_BUF.init([0; 1024]),
        UART0_RX_BUF.init([0; 1024]),
        uart_config,
    );
    rc_bridge_firmware::log_info!("UART0 initialized ({} baud)", config.serial.baud_rate);

    spawner.spawn(control_loop_task(uart0, config.failsafe).unwrap());

    spawner.spawn(
        ap_init_task(
            spawner,
            ApConfig::from_params(&config.net),
            p.PIN_23,
            p.PIN_24,
            p.PIN_25,
            p.PIN_29,
            p.PIO0,
            p.DMA_CH0,
        )
        .unwrap(),
    );

    let stack = wait_network_ready().await;

    spawner.spawn(radio_task(stack, config.net.radio_port).unwrap());
    for slot in 0..MAX_SESSIONS {
        spawner.spawn(session_task(stack, config.net.bridge_port, slot).unwrap());
    }
    spawner.spawn(status_task(stack, config.net.status_port).unwrap());

    rc_bridge_firmware::log_info!(
        "Bridge ready: radio {}, session {}, status {}",
        config.net.radio_port,
        config.net.bridge_port,
        config.net.status_port
    );
}
