//! UDP control frame receiver
//!
//! Each datagram on the radio port is one control payload. The sender's
//! endpoint stands in for the radio peer address.
//!
//! Nothing on the receive path logs or allocates; bad payloads are only
//! counted.

use embassy_net::udp::{PacketMetadata, UdpSocket};
use embassy_net::{IpAddress, IpEndpoint, Stack};
use rc_bridge_core::receiver::{FrameReceiver, PeerId, MAX_PAYLOAD_LEN};
use rc_bridge_core::traits::Clock;

use crate::core::state::LINK;
use crate::platform::error::NetworkError;
use crate::platform::EmbassyClock;

/// Peer identity from an IPv4 endpoint: four address bytes then the port
pub fn peer_id(endpoint: IpEndpoint) -> PeerId {
    let addr = match endpoint.addr {
        IpAddress::Ipv4(v4) => v4.octets(),
        #[allow(unreachable_patterns)]
        _ => [0; 4],
    };
    let port = endpoint.port.to_be_bytes();
    PeerId([addr[0], addr[1], addr[2], addr[3], port[0], port[1]])
}

#[embassy_executor::task]
pub async fn radio_task(stack: Stack<'static>, port: u16) {
    let mut rx_meta = [PacketMetadata::EMPTY; 8];
    let mut rx_buffer = [0u8; MAX_PAYLOAD_LEN];
    let mut tx_meta = [PacketMetadata::EMPTY; 1];
    let mut tx_buffer = [0u8; 32];

    let mut socket = UdpSocket::new(
        stack,
        &mut rx_meta,
        &mut rx_buffer,
        &mut tx_meta,
        &mut tx_buffer,
    );
    if socket.bind(port).is_err() {
        crate::log_error!(
            "Radio disabled: {:?}",
            crate::platform::PlatformError::from(NetworkError::BindFailed(port))
        );
        return;
    }
    crate::log_info!("Radio listening on UDP port {}", port);

    let receiver = FrameReceiver::new(&LINK);
    let clock = EmbassyClock;

    loop {
        // Decoded in place from the socket buffer, so trailing bytes never
        // cause a truncation error
        socket
            .recv_from_with(|data, meta| {
                receiver.on_receive(peer_id(meta.endpoint), data, clock.now_ms());
            })
            .await;
    }
}
