//! Host simulation of the RC link bridge
//!
//! Runs the same core logic as the firmware on a desktop machine:
//!
//! - UDP datagrams stand in for the radio link ([`radio`])
//! - TCP connections are the socket sessions ([`session`])
//! - an in-memory UART plays the flight controller port ([`uart`])
//! - a thread drives the PPM generator and decodes its edges ([`pin`])
//! - an HTTP server renders the status page ([`status`])
//!
//! [`node::SitlNode`] wires all of them together.

pub mod clock;
pub mod error;
pub mod node;
pub mod pin;
pub mod radio;
pub mod session;
pub mod status;
pub mod uart;

pub use clock::HostClock;
pub use error::SitlError;
pub use node::{NodeConfig, NodeHandle, SitlNode};
pub use pin::{DecodedFrame, PulseDecoder, PulseTrace};
pub use radio::{UdpRadio, UdpTransmitter};
pub use session::{Inbound, SessionHub, SessionServer};
pub use status::{StatusBoard, StatusServer};
pub use uart::SitlUart;
