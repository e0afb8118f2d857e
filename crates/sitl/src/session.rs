//! TCP socket sessions for SITL.
//!
//! [`SessionServer`] accepts connections and reports them as [`Inbound`]
//! messages on an mpsc channel. The control loop applies those to the
//! serial bridge and sends serial data back through [`SessionHub`].

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use log::{info, warn};
use rc_bridge_core::bridge::{SessionEvent, SessionId, SessionSendError, SessionTransport};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use crate::error::SitlError;

/// Queued messages per session before sends are refused.
const OUTBOUND_DEPTH: usize = 32;

/// Largest payload read from a session in one go.
const READ_CHUNK: usize = 256;

/// Owned form of [`SessionEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Connected(SessionId),
    Disconnected(SessionId),
    Binary(SessionId, Vec<u8>),
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

type Outbound = Arc<Mutex<HashMap<SessionId, mpsc::Sender<Vec<u8>>>>>;

/// Outbound half of the session layer.
///
/// Non-blocking: a full queue or an unknown session is a send failure.
#[derive(Debug, Clone, Default)]
pub struct SessionHub {
    outbound: Outbound,
}

impl SessionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open sessions.
    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn table(&self) -> std::sync::MutexGuard<'_, HashMap<SessionId, mpsc::Sender<Vec<u8>>>> {
        self.outbound.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn insert(&self, id: SessionId, sender: mpsc::Sender<Vec<u8>>) {
        self.table().insert(id, sender);
    }

    fn remove(&self, id: SessionId) {
        self.table().remove(&id);
    }
}

impl SessionTransport for SessionHub {
    fn send_binary(&mut self, session: SessionId, data: &[u8]) -> Result<(), SessionSendError> {
        let table = self.table();
        let sender = table.get(&session).ok_or(SessionSendError)?;
        sender.try_send(data.to_vec()).map_err(|_| SessionSendError)
    }
}

/// Accepts TCP sessions on the bridge port.
pub struct SessionServer {
    listener: TcpListener,
    hub: SessionHub,
    next_id: Arc<AtomicU32>,
}

impl SessionServer {
    pub async fn bind(addr: SocketAddr, hub: SessionHub) -> Result<Self, SitlError> {
        let listener = TcpListener::bind(addr).await?;
        info!("Bridge sessions on TCP {}", listener.local_addr()?);
        Ok(Self {
            listener,
            hub,
            next_id: Arc::new(AtomicU32::new(1)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, SitlError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept forever, one task per connection.
    pub async fn run(self, inbound: mpsc::Sender<Inbound>) -> Result<(), SitlError> {
        loop {
            let (stream, peer) = self.listener.accept().await?;
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            info!("Session {id} from {peer}");
            tokio::spawn(serve(stream, id, self.hub.clone(), inbound.clone()));
        }
    }
}

async fn serve(stream: TcpStream, id: SessionId, hub: SessionHub, inbound: mpsc::Sender<Inbound>) {
    let (tx, mut rx) = mpsc::channel::<Vec<u8>>(OUTBOUND_DEPTH);
    hub.insert(id, tx);
    if inbound.send(Inbound::Connected(id)).await.is_err() {
        hub.remove(id);
        return;
    }

    let (mut reader, mut writer) = stream.into_split();
    let mut buf = [0u8; READ_CHUNK];
    loop {
        tokio::select! {
            read = reader.read(&mut buf) => match read {
                Ok(0) => break,
                Ok(len) => {
                    if inbound.send(Inbound::Binary(id, buf[..len].to_vec())).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Session {id} read failed: {e}");
                    break;
                }
            },
            outbound = rx.recv() => match outbound {
                Some(data) => {
                    if let Err(e) = writer.write_all(&data).await {
                        warn!("Session {id} write failed: {e}");
                        break;
                    }
                }
                None => break,
            },
        }
    }

    hub.remove(id);
    let _ = inbound.send(Inbound::Disconnected(id)).await;
    info!("Session {id} closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hub_refuses_unknown_session() {
        let mut hub = SessionHub::new();
        assert_eq!(hub.send_binary(1, b"x"), Err(SessionSendError));
    }

    #[test]
    fn test_hub_queues_and_refuses_when_full() {
        let mut hub = SessionHub::new();
        let (tx, mut rx) = mpsc::channel(1);
        hub.insert(4, tx);

        assert_eq!(hub.send_binary(4, b"one"), Ok(()));
        assert_eq!(hub.send_binary(4, b"two"), Err(SessionSendError));
        assert_eq!(rx.try_recv().unwrap(), b"one");

        hub.remove(4);
        assert!(hub.is_empty());
    }

    #[test]
    fn test_inbound_as_event() {
        let message = Inbound::Binary(2, b"abc".to_vec());
        assert_eq!(message.as_event(), SessionEvent::Binary(2, b"abc"));
    }
}
