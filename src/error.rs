//! Error types and handling.

use thiserror::Error;

/// Driver-wide error type
#[derive(Error, Debug)]
pub enum DriverError {
    /// Transport could not be opened or is not usable
    #[error("Transport not ready: {0}")]
    TransportNotReady(String),

    /// No matching reply arrived within the configured window
    #[error("Timeout: {0}")]
    Timeout(String),

    /// A command parameter was outside its documented range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A reply matched the expected opcode but carried unexpected structure
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The engine has been shut down; no further commands are accepted
    #[error("Driver is shut down")]
    Closed,

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Packet construction failed (payload too large)
    #[error("Packet error: {0}")]
    Packet(#[from] crate::packet::PacketError),
}

/// Result type alias for DriverError
pub type Result<T> = std::result::Result<T, DriverError>;

impl DriverError {
    /// Create a timeout error with message
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create an invalid argument error with message
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a protocol error with message
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a transport error with message
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::TransportNotReady(msg.into())
    }
}
