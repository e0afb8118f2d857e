use rc_bridge_firmware::platform::PlatformError;

/// Errors that can occur while running the simulation.
#[derive(Debug, thiserror::Error)]
pub enum SitlError {
    #[error("Invalid address: {0}")]
    Address(#[from] std::net::AddrParseError),

    #[error("Invalid configuration: {0}")]
    Config(PlatformError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PlatformError> for SitlError {
    fn from(error: PlatformError) -> Self {
        SitlError::Config(error)
    }
}
