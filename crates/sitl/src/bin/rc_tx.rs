//! Simulated transmitter: streams control frames to a bridge over UDP.
//!
//! Usage:
//!   cargo run -p rc_bridge_sitl --bin rc_tx -- --target 127.0.0.1:4210 --sweep
//!
//! Stop it (Ctrl+C) to watch the bridge fall back to failsafe.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use log::info;
use rc_bridge_core::channels::{ChannelFrame, CHANNEL_COUNT, MAX_PULSE_US, MIN_PULSE_US};
use rc_bridge_sitl::{SitlError, UdpTransmitter};

#[derive(Parser, Debug)]
#[command(about = "Stream RC control frames over UDP")]
struct Args {
    /// Bridge radio address
    #[arg(long, default_value = "127.0.0.1:4210")]
    target: SocketAddr,
    /// Frames per second
    #[arg(long, default_value_t = 50)]
    rate_hz: u32,
    /// Value sent on every channel (us)
    #[arg(long, default_value_t = 1500)]
    value: u16,
    /// Sweep channel 1 between the channel limits instead
    #[arg(long)]
    sweep: bool,
    /// Stop after this many frames
    #[arg(long)]
    count: Option<u64>,
}

fn sweep_frame(value: u16, step: u64) -> ChannelFrame {
    let span = u64::from(MAX_PULSE_US - MIN_PULSE_US);
    let phase = (step * 10) % (2 * span);
    let offset = if phase < span { phase } else { 2 * span - phase };
    let mut values = [value; CHANNEL_COUNT];
    values[0] = MIN_PULSE_US + offset as u16;
    ChannelFrame::new(values)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), SitlError> {
    pretty_env_logger::init();
    let args = Args::parse();

    let tx = UdpTransmitter::connect(args.target).await?;
    let period = Duration::from_micros(1_000_000 / u64::from(args.rate_hz.max(1)));
    let mut interval = tokio::time::interval(period);
    info!("Sending to {} at {} Hz", args.target, args.rate_hz);

    let mut sent: u64 = 0;
    while args.count.is_none_or(|count| sent < count) {
        interval.tick().await;
        let frame = if args.sweep {
            sweep_frame(args.value, sent)
        } else {
            ChannelFrame::uniform(args.value)
        };
        tx.send_frame(&frame).await?;
        sent += 1;

        if sent.is_multiple_of(u64::from(args.rate_hz.max(1))) {
            info!("{sent} frames sent, CH1 = {}", frame.values()[0]);
        }
    }
    Ok(())
}
