//! TCP socket sessions for the serial bridge
//!
//! A fixed pool of session tasks each own one listening socket on the bridge
//! port. Session tasks and the cooperative loop exchange messages through
//! channels only:
//!
//! - [`INBOUND`]: connect, disconnect and payload notifications for the loop
//! - per-slot outbound queues, fed by [`SessionRouter`] from the loop
//!
//! Session ids encode their slot (`id % MAX_SESSIONS`) and never repeat
//! within a power cycle, so a late send for a closed session is refused
//! rather than delivered to its successor.

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_futures::select::{select, Either};
use embassy_net::tcp::TcpSocket;
use embassy_net::Stack;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Duration, Timer};
use embedded_io_async::Write as _;
use heapless::Vec;
use rc_bridge_core::bridge::{
    SessionEvent, SessionId, SessionSendError, SessionTransport, DEFAULT_BRIDGE_BUFFER,
};

use crate::platform::error::NetworkError;

/// Concurrent TCP sessions
pub const MAX_SESSIONS: usize = 2;

/// Largest single session payload
pub const SESSION_PAYLOAD: usize = DEFAULT_BRIDGE_BUFFER;

const INBOUND_DEPTH: usize = 8;
const OUTBOUND_DEPTH: usize = 4;

/// Owned form of [`SessionEvent`] that can cross task boundaries
#[derive(Debug, Clone)]
pub enum Inbound {
    Connected(SessionId),
    Disconnected(SessionId),
    Binary(SessionId, Vec<u8, SESSION_PAYLOAD>),
}

impl Inbound {
    pub fn as_event(&self) -> SessionEvent<'_> {
        match self {
            Inbound::Connected(id) => SessionEvent::Connected(*id),
            Inbound::Disconnected(id) => SessionEvent::Disconnected(*id),
            Inbound::Binary(id, data) => SessionEvent::Binary(*id, data.as_slice()),
        }
    }
}

/// Session notifications consumed by the cooperative loop
pub static INBOUND: Channel<CriticalSectionRawMutex, Inbound, INBOUND_DEPTH> = Channel::new();

type Outbound = Channel<CriticalSectionRawMutex, Vec<u8, SESSION_PAYLOAD>, OUTBOUND_DEPTH>;

static OUTBOUND: [Outbound; MAX_SESSIONS] = [const { Channel::new() }; MAX_SESSIONS];

/// Id currently served by each slot, 0 when idle
static CURRENT: [AtomicU32; MAX_SESSIONS] = [const { AtomicU32::new(0) }; MAX_SESSIONS];

static GENERATION: AtomicU32 = AtomicU32::new(1);

fn next_id(slot: usize) -> SessionId {
    let generation = GENERATION.fetch_add(1, Ordering::Relaxed);
    generation.wrapping_mul(MAX_SESSIONS as u32) + slot as u32
}

fn slot_of(id: SessionId) -> usize {
    id as usize % MAX_SESSIONS
}

/// [`SessionTransport`] that queues payloads for the session tasks
///
/// Never waits: a full queue or a stale id is reported as a send failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct SessionRouter;

impl SessionTransport for SessionRouter {
    fn send_binary(&mut self, session: SessionId, data: &[u8]) -> Result<(), SessionSendError> {
        let slot = slot_of(session);
        if CURRENT[slot].load(Ordering::Acquire) != session {
            return Err(SessionSendError);
        }
        let payload = Vec::from_slice(data).map_err(|_| SessionSendError)?;
        OUTBOUND[slot].try_send(payload).map_err(|_| SessionSendError)
    }
}

async fn serve(socket: &mut TcpSocket<'_>, id: SessionId, slot: usize) {
    let mut buffer = [0u8; SESSION_PAYLOAD];
    loop {
        match select(socket.read(&mut buffer), OUTBOUND[slot].receive()).await {
            Either::First(Ok(0)) | Either::First(Err(_)) => return,
            Either::First(Ok(len)) => {
                // len never exceeds the buffer, which matches the payload capacity
                if let Ok(payload) = Vec::from_slice(&buffer[..len]) {
                    INBOUND.send(Inbound::Binary(id, payload)).await;
                }
            }
            Either::Second(data) => {
                if socket.write_all(&data).await.is_err() {
                    return;
                }
            }
        }
    }
}

/// One session slot on the bridge port
#[embassy_executor::task(pool_size = MAX_SESSIONS)]
pub async fn session_task(stack: Stack<'static>, port: u16, slot: usize) {
    let mut rx_buffer = [0u8; 1024];
    let mut tx_buffer = [0u8; 1024];

    loop {
        let mut socket = TcpSocket::new(stack, &mut rx_buffer, &mut tx_buffer);
        socket.set_timeout(Some(Duration::from_secs(10)));
        socket.set_keep_alive(Some(Duration::from_secs(2)));

        if socket.accept(port).await.is_err() {
            crate::log_warn!(
                "Session slot {}: {:?}",
                slot,
                crate::platform::PlatformError::from(NetworkError::AcceptFailed(port))
            );
            Timer::after(Duration::from_millis(100)).await;
            continue;
        }

        let id = next_id(slot);
        while OUTBOUND[slot].try_receive().is_ok() {}
        CURRENT[slot].store(id, Ordering::Release);
        INBOUND.send(Inbound::Connected(id)).await;

        serve(&mut socket, id, slot).await;

        CURRENT[slot].store(0, Ordering::Release);
        INBOUND.send(Inbound::Disconnected(id)).await;
        socket.close();
        let _ = socket.flush().await;
        socket.abort();
    }
}
