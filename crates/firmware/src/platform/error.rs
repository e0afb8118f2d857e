//! Platform error types
//!
//! This module defines error types for platform operations.

use core::fmt;

use rc_bridge_core::bridge::BridgeError;
use rc_bridge_core::parameters::ParameterError;
use rc_bridge_core::ppm::PpmConfigError;

/// Result type for platform operations
pub type Result<T> = core::result::Result<T, PlatformError>;

/// Platform-level errors
///
/// All platform implementations map their HAL-specific errors to these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "pico2_w", derive(defmt::Format))]
pub enum PlatformError {
    /// UART operation failed
    Uart(UartError),
    /// Timer operation failed
    Timer(TimerError),
    /// Network operation failed
    Network(NetworkError),
    /// Invalid configuration provided
    InvalidConfig(ConfigError),
}

/// UART-specific errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "pico2_w", derive(defmt::Format))]
pub enum UartError {
    /// Write operation failed
    WriteFailed,
    /// Read operation failed
    ReadFailed,
    /// Receive FIFO overrun
    Overrun,
    /// Framing, parity or break condition
    LineError,
}

/// Timer-specific errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "pico2_w", derive(defmt::Format))]
pub enum TimerError {
    /// PPM output already running
    AlreadyStarted,
}

/// Network-specific errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "pico2_w", derive(defmt::Format))]
pub enum NetworkError {
    /// Empty SSID, wireless path disabled
    NotConfigured,
    /// Socket could not be bound to its port
    BindFailed(u16),
    /// Listening socket failed to accept
    AcceptFailed(u16),
    /// Session output queue full or session gone
    SessionSendFailed(u32),
}

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "pico2_w", derive(defmt::Format))]
pub enum ConfigError {
    /// Channel limits inverted
    InvertedLimits,
    /// Pulse width not below the minimum channel width
    PulseTooWide,
    /// Worst-case frame exceeds the frame length
    FrameTooShort { worst_case_us: u32 },
    /// Link timeout of zero
    ZeroTimeout,
    /// Parameter store rejected an operation
    Parameter,
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformError::Uart(e) => write!(f, "UART error: {:?}", e),
            PlatformError::Timer(e) => write!(f, "Timer error: {:?}", e),
            PlatformError::Network(e) => write!(f, "Network error: {:?}", e),
            PlatformError::InvalidConfig(e) => write!(f, "Invalid configuration: {:?}", e),
        }
    }
}

impl From<UartError> for PlatformError {
    fn from(error: UartError) -> Self {
        PlatformError::Uart(error)
    }
}

impl From<TimerError> for PlatformError {
    fn from(error: TimerError) -> Self {
        PlatformError::Timer(error)
    }
}

impl From<NetworkError> for PlatformError {
    fn from(error: NetworkError) -> Self {
        PlatformError::Network(error)
    }
}

impl From<embedded_io::ErrorKind> for UartError {
    fn from(kind: embedded_io::ErrorKind) -> Self {
        match kind {
            embedded_io::ErrorKind::OutOfMemory => UartError::Overrun,
            embedded_io::ErrorKind::InvalidData => UartError::LineError,
            embedded_io::ErrorKind::WriteZero => UartError::WriteFailed,
            _ => UartError::ReadFailed,
        }
    }
}

impl From<BridgeError> for PlatformError {
    fn from(error: BridgeError) -> Self {
        match error {
            BridgeError::Serial(kind) => PlatformError::Uart(kind.into()),
            BridgeError::Session(id) => {
                PlatformError::Network(NetworkError::SessionSendFailed(id))
            }
        }
    }
}

impl From<PpmConfigError> for PlatformError {
    fn from(error: PpmConfigError) -> Self {
        let config = match error {
            PpmConfigError::InvertedLimits => ConfigError::InvertedLimits,
            PpmConfigError::PulseTooWide => ConfigError::PulseTooWide,
            PpmConfigError::FrameTooShort { worst_case_us } => {
                ConfigError::FrameTooShort { worst_case_us }
            }
        };
        PlatformError::InvalidConfig(config)
    }
}

impl From<ParameterError> for PlatformError {
    fn from(_: ParameterError) -> Self {
        PlatformError::InvalidConfig(ConfigError::Parameter)
    }
}
