//! Network error types

use core::fmt;

pub type Result<T> = core::result::Result<T, NetworkError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// Address is unspecified, broadcast or otherwise unusable.
    InvalidAddress,
    /// Host name is not a legal DNS name.
    InvalidName,
    /// Buffer too small for operation.
    BufferTooSmall,
    /// No UDP/TCP port left in the stack's budget.
    PortExhausted,
    /// A request of the same kind is already outstanding.
    Busy,
    /// No resolution has been started (or it was aborted).
    NoResolution,
    /// Resolution started but not finished yet.
    Pending,
    /// Socket could not be created or bound.
    SocketFailed,
    /// Send operation failed.
    SendFailed,
    /// Receive operation failed.
    ReceiveFailed,
    /// Device-level error with description.
    DeviceError(alloc::string::String),
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAddress => write!(f, "Invalid address"),
            Self::InvalidName => write!(f, "Invalid host name"),
            Self::BufferTooSmall => write!(f, "Buffer too small"),
            Self::PortExhausted => write!(f, "No free port in stack budget"),
            Self::Busy => write!(f, "Request already outstanding"),
            Self::NoResolution => write!(f, "No resolution in progress"),
            Self::Pending => write!(f, "Resolution still pending"),
            Self::SocketFailed => write!(f, "Socket setup failed"),
            Self::SendFailed => write!(f, "Send failed"),
            Self::ReceiveFailed => write!(f, "Receive failed"),
            Self::DeviceError(msg) => write!(f, "Device error: {}", msg),
        }
    }
}
