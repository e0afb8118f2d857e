//! UDP stand-in for the radio link.
//!
//! [`UdpRadio`] is the receiving side inside the node; [`UdpTransmitter`] is
//! what the `rc_tx` binary and the tests use to send control frames.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use log::info;
use rc_bridge_core::channels::ChannelFrame;
use rc_bridge_core::protocol::encode_frame;
use rc_bridge_core::receiver::{FrameReceiver, PeerId, MAX_PAYLOAD_LEN};
use rc_bridge_core::shared::ControlLink;
use rc_bridge_core::traits::Clock;
use tokio::net::UdpSocket;

use crate::clock::HostClock;
use crate::error::SitlError;

/// Peer identity of a datagram sender: IPv4 address bytes then the port.
///
/// IPv6 senders map to their last four address bytes.
pub fn peer_id(addr: SocketAddr) -> PeerId {
    let ip = match addr.ip() {
        IpAddr::V4(v4) => v4.octets(),
        IpAddr::V6(v6) => {
            let o = v6.octets();
            [o[12], o[13], o[14], o[15]]
        }
    };
    let port = addr.port().to_be_bytes();
    PeerId([ip[0], ip[1], ip[2], ip[3], port[0], port[1]])
}

/// Receives control payloads and feeds them to the frame receiver.
pub struct UdpRadio {
    socket: UdpSocket,
}

impl UdpRadio {
    pub async fn bind(addr: SocketAddr) -> Result<Self, SitlError> {
        let socket = UdpSocket::bind(addr).await?;
        info!("Radio listening on UDP {}", socket.local_addr()?);
        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, SitlError> {
        Ok(self.socket.local_addr()?)
    }

    /// Receive forever. Returns only on a socket error.
    pub async fn run(self, link: Arc<ControlLink>, clock: HostClock) -> Result<(), SitlError> {
        let receiver = FrameReceiver::new(&link);
        let mut buf = [0u8; MAX_PAYLOAD_LEN];
        loop {
            let (len, from) = self.socket.recv_from(&mut buf).await?;
            receiver.on_receive(peer_id(from), &buf[..len], clock.now_ms());
        }
    }
}

/// Sends encoded control frames to a radio address.
pub struct UdpTransmitter {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpTransmitter {
    pub async fn connect(target: SocketAddr) -> Result<Self, SitlError> {
        let bind: SocketAddr = if target.is_ipv4() {
            "0.0.0.0:0".parse()?
        } else {
            "[::]:0".parse()?
        };
        let socket = UdpSocket::bind(bind).await?;
        Ok(Self { socket, target })
    }

    pub async fn send_frame(&self, frame: &ChannelFrame) -> Result<(), SitlError> {
        self.send_raw(&encode_frame(frame)).await
    }

    /// Send arbitrary bytes, e.g. malformed payloads in tests.
    pub async fn send_raw(&self, payload: &[u8]) -> Result<(), SitlError> {
        self.socket.send_to(payload, self.target).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_id_from_v4() {
        let addr: SocketAddr = "192.168.4.20:4210".parse().unwrap();
        assert_eq!(peer_id(addr), PeerId([192, 168, 4, 20, 0x10, 0x72]));
    }
}
