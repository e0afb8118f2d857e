//! Simulated RC link bridge on the host.
//!
//! Usage:
//!   RUST_LOG=info cargo run -p rc_bridge_sitl --bin rc_bridge_sitl -- [OPTIONS]
//!
//! Drive it with `rc_tx`, connect a ground station to the bridge port, and
//! open the status page in a browser.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use log::info;
use rc_bridge_core::failsafe::FailsafeConfig;
use rc_bridge_sitl::{NodeConfig, SitlError, SitlNode};

#[derive(Parser, Debug)]
#[command(about = "Simulated RC link bridge")]
struct Args {
    /// UDP address receiving control frames
    #[arg(long, default_value = "0.0.0.0:4210")]
    radio: SocketAddr,
    /// TCP address for serial bridge sessions
    #[arg(long, default_value = "0.0.0.0:8888")]
    bridge: SocketAddr,
    /// TCP address of the status page
    #[arg(long, default_value = "0.0.0.0:8080")]
    status: SocketAddr,
    /// Link timeout before failsafe (ms)
    #[arg(long, default_value_t = 500)]
    timeout_ms: u32,
    /// Channel value published on failsafe (us)
    #[arg(long, default_value_t = 900)]
    failsafe_us: u16,
    /// Cooperative loop period (ms)
    #[arg(long, default_value_t = 10)]
    loop_ms: u64,
    /// Echo bridge output back as flight controller input
    #[arg(long)]
    loopback: bool,
    /// Seconds between channel summaries, 0 to disable
    #[arg(long, default_value_t = 5)]
    report_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), SitlError> {
    pretty_env_logger::init();
    let args = Args::parse();

    let config = NodeConfig {
        radio_addr: args.radio,
        bridge_addr: args.bridge,
        status_addr: args.status,
        failsafe: FailsafeConfig {
            timeout_ms: args.timeout_ms,
            frame: rc_bridge_core::channels::ChannelFrame::uniform(args.failsafe_us),
        },
        loop_period: Duration::from_millis(args.loop_ms.max(1)),
        loopback: args.loopback,
        ..NodeConfig::default()
    };

    let node = SitlNode::start(config).await?;
    println!("=== rc-bridge SITL ===");
    println!(
        "radio udp://{}  bridge tcp://{}  status http://{}/",
        node.radio_addr, node.bridge_addr, node.status_addr
    );
    println!("Press Ctrl+C to stop.\n");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let period = Duration::from_secs(args.report_secs.max(1));
    let mut report = tokio::time::interval(period);
    report.tick().await;

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                println!("\nShutdown requested.");
                break;
            }
            _ = report.tick(), if args.report_secs > 0 => {
                if let Some(status) = node.status.latest() {
                    info!(
                        "{:?} accepted={} rejected={} trips={} session={} ppm={} ch={:?}",
                        status.link_state,
                        status.accepted,
                        status.rejected,
                        status.trips,
                        status.session_active,
                        status.frames,
                        node.last_ppm_frame().map(|f| f.channels_us),
                    );
                }
            }
        }
    }

    node.shutdown();
    Ok(())
}
