//! Soft-AP network bring-up for the Pico 2 W
//!
//! Starts the CYW43439 as an access point and runs the embassy-net stack on
//! a fixed address. Transmitters and ground stations join the AP and use
//! static addresses in the same /24.
//!
//! # Bring-up Flow
//!
//! ```text
//! 1. Load CYW43439 firmware and CLM blobs
//! 2. Initialize PIO SPI and the cyw43 driver, spawn its runner
//! 3. Create the embassy-net stack, spawn its runner
//! 4. Start the AP (WPA2 when a passphrase is set, open otherwise)
//! 5. Publish the stack for the radio, session and status tasks
//! ```
//!
//! Any failure is logged once. The PPM output keeps running at whatever the
//! watchdog publishes, and the serial bridge stays idle.

use cyw43::aligned_bytes;
use cyw43_pio::DEFAULT_CLOCK_DIVIDER;
use embassy_executor::Spawner;
use embassy_net::{
    Config as NetConfig, Ipv4Address, Ipv4Cidr, Stack, StackResources, StaticConfigV4,
};
use embassy_rp::clocks::RoscRng;
use embassy_rp::{
    bind_interrupts,
    gpio::{Level, Output},
    peripherals::{DMA_CH0, PIN_23, PIN_24, PIN_25, PIN_29, PIO0},
    pio::{InterruptHandler as PioInterruptHandler, Pio},
    Peri,
};
use embassy_sync::once_lock::OnceLock;
use embassy_time::{Duration, Timer};
use heapless::String;
use rand_core::RngCore;
use rc_bridge_core::parameters::net::{NetParams, PASSWORD_MAX_LEN, SSID_MAX_LEN};
use static_cell::StaticCell;

use crate::platform::error::NetworkError;

/// Address of the bridge on its own AP
pub const AP_ADDRESS: [u8; 4] = [192, 168, 4, 1];

/// Prefix length of the AP network
pub const AP_PREFIX_LEN: u8 = 24;

/// 2.4 GHz channel the AP starts on
pub const AP_CHANNEL: u8 = 6;

/// Sockets: UDP radio, two TCP sessions, one HTTP status connection
const SOCKET_COUNT: usize = 4;

static STACK: OnceLock<Stack<'static>> = OnceLock::new();

/// Soft-AP settings
#[derive(Debug, Clone)]
pub struct ApConfig {
    pub ssid: String<SSID_MAX_LEN>,
    pub password: String<PASSWORD_MAX_LEN>,
    /// Use WPA2 (password long enough) rather than an open AP
    pub secured: bool,
    pub channel: u8,
}

impl ApConfig {
    pub fn from_params(params: &NetParams) -> Self {
        Self {
            ssid: params.ssid.clone(),
            password: params.password.clone(),
            secured: params.is_secured(),
            channel: AP_CHANNEL,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.ssid.is_empty()
    }
}

/// Wait until the AP is up and return its network stack
pub async fn wait_network_ready() -> Stack<'static> {
    *STACK.get().await
}

bind_interrupts!(pub struct PioIrqs {
    PIO0_IRQ_0 => PioInterruptHandler<PIO0>;
});

/// Bring up the soft-AP, then keep the cyw43 `Control` alive forever
#[allow(clippy::too_many_arguments)]
pub async fn initialize_ap(
    spawner: Spawner,
    config: ApConfig,
    pin_23: Peri<'static, PIN_23>,
    pin_24: Peri<'static, PIN_24>,
    pin_25: Peri<'static, PIN_25>,
    pin_29: Peri<'static, PIN_29>,
    pio0: Peri<'static, PIO0>,
    dma_ch0: Peri<'static, DMA_CH0>,
) -> ! {
    if !config.is_configured() {
        crate::log_error!(
            "Wireless disabled: {:?}",
            crate::platform::PlatformError::from(NetworkError::NotConfigured)
        );
        park().await
    }

    let mut rng = RoscRng;

    let fw = aligned_bytes!("../../../../../cyw43-firmware/43439A0.bin");
    let clm = include_bytes!("../../../../../cyw43-firmware/43439A0_clm.bin");
    let nvram = aligned_bytes!("../../../../../cyw43-firmware/nvram_rp2040.bin");

    let pwr = Output::new(pin_23, Level::Low);
    let cs = Output::new(pin_25, Level::High);
    let mut pio = Pio::new(pio0, PioIrqs);
    let spi = cyw43_pio::PioSpi::new(
        &mut pio.common,
        pio.sm0,
        DEFAULT_CLOCK_DIVIDER,
        pio.irq0,
        cs,
        pin_24, // DIO
        pin_29, // CLK
        dma_ch0,
    );

    static STATE: StaticCell<cyw43::State> = StaticCell::new();
    let state = STATE.init(cyw43::State::new());
    let (net_device, mut control, runner) = cyw43::new(state, pwr, spi, fw, nvram).await;

    // Control must stay a local of this future; see the park loop below.
    spawner.spawn(wifi_task(runner).unwrap());

    control.init(clm).await;
    control
        .set_power_management(cyw43::PowerManagementMode::None)
        .await;

    let net_config = NetConfig::ipv4_static(StaticConfigV4 {
        address: Ipv4Cidr::new(
            Ipv4Address::new(AP_ADDRESS[0], AP_ADDRESS[1], AP_ADDRESS[2], AP_ADDRESS[3]),
            AP_PREFIX_LEN,
        ),
        gateway: None,
        dns_servers: Default::default(),
    });

    static STACK_RESOURCES: StaticCell<StackResources<SOCKET_COUNT>> = StaticCell::new();
    let (stack, runner) = embassy_net::new(
        net_device,
        net_config,
        STACK_RESOURCES.init(StackResources::new()),
        rng.next_u64(),
    );
    spawner.spawn(net_task(runner).unwrap());

    if config.secured {
        control
            .start_ap_wpa2(config.ssid.as_str(), config.password.as_str(), config.channel)
            .await;
    } else {
        if !config.password.is_empty() {
            crate::log_warn!("Passphrase shorter than 8 characters, starting an open AP");
        }
        control
            .start_ap_open(config.ssid.as_str(), config.channel)
            .await;
    }

    crate::log_info!(
        "AP '{}' up on channel {} at {}.{}.{}.{}/{}",
        config.ssid.as_str(),
        config.channel,
        AP_ADDRESS[0],
        AP_ADDRESS[1],
        AP_ADDRESS[2],
        AP_ADDRESS[3],
        AP_PREFIX_LEN
    );

    let _ = STACK.init(stack);

    park().await
}

async fn park() -> ! {
    loop {
        Timer::after(Duration::from_secs(3600)).await;
    }
}

#[embassy_executor::task]
async fn wifi_task(
    runner: cyw43::Runner<
        'static,
        cyw43::SpiBus<Output<'static>, cyw43_pio::PioSpi<'static, PIO0, 0, DMA_CH0>>,
    >,
) -> ! {
    runner.run().await
}

#[embassy_executor::task]
async fn net_task(mut runner: embassy_net::Runner<'static, cyw43::NetDriver<'static>>) -> ! {
    runner.run().await
}

/// Task wrapper for [`initialize_ap`]
#[embassy_executor::task]
#[allow(clippy::too_many_arguments)]
pub async fn ap_init_task(
    spawner: Spawner,
    config: ApConfig,
    pin_23: Peri<'static, PIN_23>,
    pin_24: Peri<'static, PIN_24>,
    pin_25: Peri<'static, PIN_25>,
    pin_29: Peri<'static, PIN_29>,
    pio0: Peri<'static, PIO0>,
    dma_ch0: Peri<'static, DMA_CH0>,
) -> ! {
    initialize_ap(spawner, config, pin_23, pin_24, pin_25, pin_29, pio0, dma_ch0).await
}
