//! Complete simulated bridge.
//!
//! One [`SitlNode::start`] call binds the radio, session and status sockets,
//! starts the PPM thread and spawns the control loop. The returned
//! [`NodeHandle`] exposes the flight controller end of the UART and the
//! decoded PPM output.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use log::{error, info, warn};
use rc_bridge_core::failsafe::{FailsafeConfig, WatchdogEvent};
use rc_bridge_core::ppm::{PpmConfig, PpmGenerator};
use rc_bridge_core::shared::ControlLink;
use rc_bridge_core::traits::Clock;
use rc_bridge_firmware::core::config::BridgeConfig;
use rc_bridge_firmware::subsystems::LinkLoop;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::clock::HostClock;
use crate::error::SitlError;
use crate::pin::{DecodedFrame, PulseDecoder};
use crate::radio::UdpRadio;
use crate::session::{Inbound, SessionHub, SessionServer};
use crate::status::{StatusBoard, StatusServer};
use crate::uart::SitlUart;

/// Default status page port; port 80 needs privileges on most hosts.
pub const DEFAULT_SITL_STATUS_PORT: u16 = 8080;

const INBOUND_DEPTH: usize = 64;

/// Node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub radio_addr: SocketAddr,
    pub bridge_addr: SocketAddr,
    pub status_addr: SocketAddr,
    pub ppm: PpmConfig,
    pub failsafe: FailsafeConfig,
    pub baud_rate: u32,
    /// Cooperative loop period.
    pub loop_period: Duration,
    /// Echo everything the bridge writes to the UART straight back.
    pub loopback: bool,
}

impl NodeConfig {
    /// Firmware defaults, listening on all interfaces.
    pub fn from_bridge_config(config: &BridgeConfig) -> Self {
        let any = |port: u16| SocketAddr::from(([0, 0, 0, 0], port));
        Self {
            radio_addr: any(config.net.radio_port),
            bridge_addr: any(config.net.bridge_port),
            status_addr: any(DEFAULT_SITL_STATUS_PORT),
            ppm: config.ppm,
            failsafe: config.failsafe,
            baud_rate: config.serial.baud_rate,
            loop_period: Duration::from_millis(10),
            loopback: false,
        }
    }

    /// Firmware defaults on loopback with ephemeral ports, for tests.
    pub fn local() -> Self {
        let local = SocketAddr::from(([127, 0, 0, 1], 0));
        Self {
            radio_addr: local,
            bridge_addr: local,
            status_addr: local,
            ..Self::default()
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self::from_bridge_config(&BridgeConfig::defaults())
    }
}

/// PPM thread output shared with the handle.
#[derive(Debug, Default)]
struct PpmMonitor {
    last: Mutex<Option<DecodedFrame>>,
    frames: AtomicU32,
}

impl PpmMonitor {
    fn last(&self) -> Option<DecodedFrame> {
        *self.last.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn set_last(&self, frame: DecodedFrame) {
        *self.last.lock().unwrap_or_else(|p| p.into_inner()) = Some(frame);
    }

    fn frames(&self) -> u32 {
        self.frames.load(Ordering::Relaxed)
    }
}

pub struct SitlNode;

impl SitlNode {
    /// Bind every socket and start all node activities.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start(config: NodeConfig) -> Result<NodeHandle, SitlError> {
        config.ppm.validate().map_err(rc_bridge_firmware::platform::PlatformError::from)?;

        let link = Arc::new(ControlLink::default());
        let clock = HostClock::new();
        let uart = SitlUart::new(config.baud_rate);
        let hub = SessionHub::new();
        let status = StatusBoard::new();
        let monitor = Arc::new(PpmMonitor::default());
        let stop = Arc::new(AtomicBool::new(false));

        let radio = UdpRadio::bind(config.radio_addr).await?;
        let sessions = SessionServer::bind(config.bridge_addr, hub.clone()).await?;
        let status_server = StatusServer::bind(config.status_addr, status.clone()).await?;

        let radio_addr = radio.local_addr()?;
        let bridge_addr = sessions.local_addr()?;
        let status_addr = status_server.local_addr()?;

        let ppm_thread = {
            let (link, monitor, stop) = (link.clone(), monitor.clone(), stop.clone());
            let ppm = config.ppm;
            thread::Builder::new()
                .name("ppm".into())
                .spawn(move || run_ppm(ppm, &link, &monitor, &stop))?
        };

        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_DEPTH);

        let mut tasks = Vec::new();
        {
            let link = link.clone();
            tasks.push(tokio::spawn(async move {
                if let Err(e) = radio.run(link, clock).await {
                    error!("Radio stopped: {e}");
                }
            }));
        }
        tasks.push(tokio::spawn(async move {
            if let Err(e) = sessions.run(inbound_tx).await {
                error!("Session server stopped: {e}");
            }
        }));
        tasks.push(tokio::spawn(async move {
            if let Err(e) = status_server.run().await {
                error!("Status server stopped: {e}");
            }
        }));
        tasks.push(tokio::spawn(control_loop(ControlLoop {
            link_loop: LinkLoop::new(config.failsafe),
            link: link.clone(),
            uart: uart.clone(),
            hub,
            inbound: inbound_rx,
            status: status.clone(),
            monitor: monitor.clone(),
            clock,
            period: config.loop_period,
            loopback: config.loopback,
        })));

        info!("Node up: radio {radio_addr}, sessions {bridge_addr}, status {status_addr}");
        info!("Link timeout {} ms", config.failsafe.timeout_ms);

        Ok(NodeHandle {
            link,
            uart,
            status,
            radio_addr,
            bridge_addr,
            status_addr,
            monitor,
            stop,
            tasks,
            ppm_thread: Some(ppm_thread),
        })
    }
}

/// Running node. Dropping it stops every task and the PPM thread.
pub struct NodeHandle {
    pub link: Arc<ControlLink>,
    /// Flight controller end of the UART.
    pub uart: SitlUart,
    pub status: StatusBoard,
    pub radio_addr: SocketAddr,
    pub bridge_addr: SocketAddr,
    pub status_addr: SocketAddr,
    monitor: Arc<PpmMonitor>,
    stop: Arc<AtomicBool>,
    tasks: Vec<JoinHandle<()>>,
    ppm_thread: Option<thread::JoinHandle<()>>,
}

impl NodeHandle {
    /// Most recent complete frame seen on the PPM output.
    pub fn last_ppm_frame(&self) -> Option<DecodedFrame> {
        self.monitor.last()
    }

    /// Completed PPM frames since start.
    pub fn ppm_frames(&self) -> u32 {
        self.monitor.frames()
    }

    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for NodeHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        for task in &self.tasks {
            task.abort();
        }
        if let Some(thread) = self.ppm_thread.take() {
            let _ = thread.join();
        }
    }
}

/// Real-time PPM generation with edge decoding instead of a GPIO.
fn run_ppm(config: PpmConfig, link: &ControlLink, monitor: &PpmMonitor, stop: &AtomicBool) {
    let mut generator = PpmGenerator::new(config);
    let mut decoder = PulseDecoder::new(&config);
    let mut deadline = Instant::now();

    while !stop.load(Ordering::Relaxed) {
        let edge = generator.fire(link.frame());
        if let Some(frame) = decoder.push(edge) {
            monitor.set_last(frame);
        }
        monitor
            .frames
            .store(generator.frames_emitted(), Ordering::Relaxed);

        deadline += Duration::from_micros(u64::from(edge.hold_us));
        let now = Instant::now();
        if deadline > now {
            thread::sleep(deadline - now);
        } else {
            // Fell behind (host preemption); restart the schedule from now
            deadline = now;
        }
    }
}

struct ControlLoop {
    link_loop: LinkLoop,
    link: Arc<ControlLink>,
    uart: SitlUart,
    hub: SessionHub,
    inbound: mpsc::Receiver<Inbound>,
    status: StatusBoard,
    monitor: Arc<PpmMonitor>,
    clock: HostClock,
    period: Duration,
    loopback: bool,
}

async fn control_loop(mut cl: ControlLoop) {
    let mut interval = tokio::time::interval(cl.period);
    let mut send_failures = 0;

    loop {
        interval.tick().await;

        while let Ok(message) = cl.inbound.try_recv() {
            match &message {
                Inbound::Connected(id) => info!("Session {id} is now the serial destination"),
                Inbound::Disconnected(id) => info!("Session {id} disconnected"),
                Inbound::Binary(..) => {}
            }
            cl.link_loop.handle_session_event(&mut cl.uart, message.as_event());
        }

        match cl.link_loop.step(&cl.link, &mut cl.uart, &mut cl.hub, cl.clock.now_ms()) {
            Some(WatchdogEvent::Engaged { silent_ms }) => {
                warn!("No control frame for {silent_ms} ms, failsafe engaged");
            }
            Some(WatchdogEvent::Restored) => info!("Control link established"),
            None => {}
        }

        let stats = cl.link_loop.bridge_stats();
        if stats.send_failures != send_failures {
            warn!("Session refused serial data ({} failures)", stats.send_failures);
            send_failures = stats.send_failures;
        }

        if cl.loopback {
            let echoed = cl.uart.drain_tx();
            if !echoed.is_empty() {
                cl.uart.inject_rx_data(&echoed);
            }
        }

        cl.status.publish(cl.link_loop.status(&cl.link, cl.monitor.frames()));
    }
}
