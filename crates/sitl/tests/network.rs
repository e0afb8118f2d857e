//! Node scenarios over real loopback sockets.

use std::future::Future;
use std::time::Duration;

use rc_bridge_core::channels::{ChannelFrame, CHANNEL_COUNT};
use rc_bridge_core::failsafe::{FailsafeConfig, LinkState};
use rc_bridge_core::protocol::encode_frame;
use rc_bridge_sitl::{NodeConfig, NodeHandle, SitlNode, UdpTransmitter};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};

const DEADLINE: Duration = Duration::from_secs(3);

async fn wait_for<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    timeout(DEADLINE, async {
        while !check().await {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .is_ok()
}

async fn start_node(timeout_ms: u32) -> NodeHandle {
    let config = NodeConfig {
        failsafe: FailsafeConfig {
            timeout_ms,
            ..FailsafeConfig::default()
        },
        ..NodeConfig::local()
    };
    SitlNode::start(config).await.unwrap()
}

#[tokio::test]
async fn udp_frame_reaches_shared_state() {
    let node = start_node(500).await;
    let tx = UdpTransmitter::connect(node.radio_addr).await.unwrap();
    let frame = ChannelFrame::new([1000, 1100, 1200, 1300, 1400, 1500, 1600, 1700]);

    let (tx, link) = (&tx, &node.link);
    assert!(
        wait_for(move || async move {
            tx.send_frame(&frame).await.unwrap();
            link.frame().snapshot() == frame
        })
        .await
    );
    assert!(node.link.stats().accepted() >= 1);

    // Malformed payloads are counted and change nothing
    let accepted = node.link.stats().accepted();
    tx.send_raw(&[0xA5, 0xDC, 0x05]).await.unwrap();
    assert!(wait_for(move || async move { link.stats().rejected() >= 1 }).await);
    assert_eq!(node.link.frame().snapshot(), frame);
    assert_eq!(node.link.stats().accepted(), accepted);

    // Trailing bytes after a valid frame are ignored
    let longer = ChannelFrame::uniform(1800);
    let mut payload = encode_frame(&longer).to_vec();
    payload.extend_from_slice(&[0xEE; 200]);
    assert!(
        wait_for(move || {
            let payload = payload.clone();
            async move {
                tx.send_raw(&payload).await.unwrap();
                link.frame().snapshot() == longer
            }
        })
        .await
    );

    node.shutdown();
}

#[tokio::test]
async fn ppm_output_follows_link_and_failsafe() {
    let node = start_node(200).await;
    let tx = UdpTransmitter::connect(node.radio_addr).await.unwrap();
    let (tx, n) = (&tx, &node);

    // Holds the failsafe output before the first frame
    assert!(wait_for(move || async move { n.last_ppm_frame().is_some() }).await);
    assert_eq!(
        node.last_ppm_frame().map(|f| f.channels_us),
        Some([900; CHANNEL_COUNT])
    );

    assert!(
        wait_for(move || async move {
            tx.send_frame(&ChannelFrame::uniform(1500)).await.unwrap();
            n.last_ppm_frame()
                .is_some_and(|f| f.channels_us == [1500; CHANNEL_COUNT])
        })
        .await
    );
    let frame = node.last_ppm_frame().unwrap();
    assert_eq!(frame.gaps_us, [1200; CHANNEL_COUNT]);
    assert_eq!(frame.period_us, 22_500);

    // Stop transmitting
    assert!(
        wait_for(move || async move {
            n.last_ppm_frame()
                .is_some_and(|f| f.channels_us == [900; CHANNEL_COUNT])
        })
        .await
    );
    assert!(
        wait_for(move || async move {
            n.status
                .latest()
                .is_some_and(|r| r.link_state == LinkState::Failsafe && r.trips == 1)
        })
        .await
    );

    node.shutdown();
}

#[tokio::test]
async fn session_bridges_serial_both_ways() {
    let node = start_node(500).await;
    let mut client = TcpStream::connect(node.bridge_addr).await.unwrap();
    let n = &node;
    assert!(
        wait_for(move || async move { n.status.latest().is_some_and(|r| r.session_active) }).await
    );

    // Flight controller to client
    node.uart.inject_rx_data(b"\xfe\x09heartbeat");
    let mut received = [0u8; 11];
    timeout(DEADLINE, client.read_exact(&mut received))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&received, b"\xfe\x09heartbeat");

    // Client to flight controller
    client.write_all(b"\xfd\x01cmd").await.unwrap();
    let mut written = Vec::new();
    let uart = node.uart.clone();
    assert!(
        wait_for(|| {
            written.extend(uart.drain_tx());
            let done = written.len() >= 5;
            async move { done }
        })
        .await
    );
    assert_eq!(written, b"\xfd\x01cmd");

    drop(client);
    assert!(
        wait_for(move || async move { n.status.latest().is_some_and(|r| !r.session_active) }).await
    );

    node.shutdown();
}

#[tokio::test]
async fn newest_session_receives_serial() {
    let node = start_node(500).await;
    let mut first = TcpStream::connect(node.bridge_addr).await.unwrap();
    let n = &node;
    assert!(
        wait_for(move || async move { n.status.latest().is_some_and(|r| r.session_active) }).await
    );
    let mut second = TcpStream::connect(node.bridge_addr).await.unwrap();
    // Give the loop time to apply the second connect
    sleep(Duration::from_millis(100)).await;

    node.uart.inject_rx_data(b"tlm");
    let mut received = [0u8; 3];
    timeout(DEADLINE, second.read_exact(&mut received))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&received, b"tlm");

    let mut stray = [0u8; 3];
    assert!(timeout(Duration::from_millis(100), first.read(&mut stray))
        .await
        .is_err());

    node.shutdown();
}

#[tokio::test]
async fn status_page_served_over_http() {
    let node = start_node(500).await;
    let n = &node;
    assert!(wait_for(move || async move { n.status.latest().is_some() }).await);

    let mut stream = TcpStream::connect(node.status_addr).await.unwrap();
    stream
        .write_all(b"GET / HTTP/1.0\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    timeout(DEADLINE, stream.read_to_string(&mut response))
        .await
        .unwrap()
        .unwrap();

    assert!(response.starts_with("HTTP/1.0 200 OK"));
    assert!(response.contains("<td>Session active</td><td>no</td>"));
    assert!(response.contains("<td>CH1</td><td>900</td>"));

    node.shutdown();
}
