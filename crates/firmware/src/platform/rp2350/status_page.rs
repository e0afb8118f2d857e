//! HTTP status page
//!
//! Answers every request on the status port with the latest
//! [`StatusReport`](rc_bridge_core::status::StatusReport), one connection at
//! a time. The request itself is read and ignored.

use core::fmt::Write as _;

use embassy_net::tcp::TcpSocket;
use embassy_net::Stack;
use embassy_time::{Duration, Timer};
use embedded_io_async::Write as _;
use heapless::String;

use crate::core::state::STATUS;

const PAGE_LEN: usize = 2048;

const NOT_READY: &str = "<!DOCTYPE html><html><body>starting</body></html>";

async fn respond(socket: &mut TcpSocket<'_>, page: &str) -> Result<(), embassy_net::tcp::Error> {
    let mut header: String<96> = String::new();
    // Fits: fixed text plus at most five digits
    let _ = write!(
        header,
        "HTTP/1.0 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\n\r\n",
        page.len()
    );
    socket.write_all(header.as_bytes()).await?;
    socket.write_all(page.as_bytes()).await?;
    socket.flush().await
}

#[embassy_executor::task]
pub async fn status_task(stack: Stack<'static>, port: u16) {
    let mut rx_buffer = [0u8; 512];
    let mut tx_buffer = [0u8; PAGE_LEN];
    let mut request = [0u8; 512];
    let mut page: String<PAGE_LEN> = String::new();

    crate::log_info!("Status page on TCP port {}", port);

    loop {
        let mut socket = TcpSocket::new(stack, &mut rx_buffer, &mut tx_buffer);
        socket.set_timeout(Some(Duration::from_secs(5)));

        if socket.accept(port).await.is_err() {
            Timer::after(Duration::from_millis(100)).await;
            continue;
        }
        let _ = socket.read(&mut request).await;

        page.clear();
        let body = match STATUS.latest() {
            Some(report) if report.render(&mut page).is_ok() => page.as_str(),
            _ => NOT_READY,
        };
        if respond(&mut socket, body).await.is_err() {
            crate::log_debug!("Status client went away");
        }

        socket.close();
        Timer::after(Duration::from_millis(10)).await;
        socket.abort();
    }
}
