//! HTTP status page for SITL.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use log::{debug, info};
use rc_bridge_core::status::StatusReport;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::error::SitlError;

const NOT_READY: &str = "<!DOCTYPE html><html><body>starting</body></html>";

/// Latest report published by the control loop.
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    latest: Arc<Mutex<Option<StatusReport>>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, report: StatusReport) {
        *self.latest.lock().unwrap_or_else(|p| p.into_inner()) = Some(report);
    }

    pub fn latest(&self) -> Option<StatusReport> {
        *self.latest.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Status page body for the current report.
    pub fn page(&self) -> String {
        let mut page = String::new();
        match self.latest() {
            Some(report) if report.render(&mut page).is_ok() => page,
            _ => NOT_READY.to_string(),
        }
    }
}

pub struct StatusServer {
    listener: TcpListener,
    board: StatusBoard,
}

impl StatusServer {
    pub async fn bind(addr: SocketAddr, board: StatusBoard) -> Result<Self, SitlError> {
        let listener = TcpListener::bind(addr).await?;
        info!("Status page on http://{}/", listener.local_addr()?);
        Ok(Self { listener, board })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, SitlError> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run(self) -> Result<(), SitlError> {
        loop {
            let (stream, peer) = self.listener.accept().await?;
            if let Err(e) = respond(stream, &self.board).await {
                debug!("Status client {peer}: {e}");
            }
        }
    }
}

async fn respond(mut stream: TcpStream, board: &StatusBoard) -> std::io::Result<()> {
    let mut request = [0u8; 1024];
    let _ = stream.read(&mut request).await?;

    let body = board.page();
    let header = format!(
        "HTTP/1.0 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\n\r\n",
        body.len()
    );
    stream.write_all(header.as_bytes()).await?;
    stream.write_all(body.as_bytes()).await?;
    stream.shutdown().await
}
