//! Device capability abstraction.
//!
//! Keeps the bring-up and pump logic generic over concrete radio bindings.
//! A target provides one implementation of [`Radio`]; the pump only needs
//! the [`FrameTransport`] half of it and the status display only [`Led`].
//!
//! # Available Variants
//!
//! - [`shared::SharedDevice`] - one radio shared between pump, bring-up and LED
//! - [`host::HostDevice`] - inert host variant (requires `std`)

use core::fmt;

use crate::types::MacAddress;

pub mod shared;
#[cfg(feature = "std")]
pub mod host;

pub use shared::SharedDevice;
#[cfg(feature = "std")]
pub use host::HostDevice;

/// TX error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxError {
    /// TX queue is full, try again later.
    QueueFull,
    /// Device not ready (not associated, powered down, no link).
    DeviceNotReady,
    /// Frame too large.
    FrameTooLarge,
    /// Bus or firmware error while handing the frame over.
    Bus,
}

impl fmt::Display for TxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull => write!(f, "tx queue full"),
            Self::DeviceNotReady => write!(f, "device not ready"),
            Self::FrameTooLarge => write!(f, "frame too large"),
            Self::Bus => write!(f, "bus error"),
        }
    }
}

/// RX error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxError {
    /// Provided buffer too small for frame.
    BufferTooSmall {
        /// Required buffer size.
        needed: usize,
    },
    /// Device error.
    DeviceError,
}

impl fmt::Display for RxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferTooSmall { needed } => write!(f, "rx buffer too small ({} needed)", needed),
            Self::DeviceError => write!(f, "device error"),
        }
    }
}

/// Radio association and bring-up errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// No radio answered on the bus.
    NotPresent,
    /// Firmware upload or chip init failed.
    Firmware,
    /// Access point rejected the credentials.
    AuthRejected,
    /// No access point with the requested SSID.
    NoNetwork,
    /// Join did not complete in time.
    Timeout,
}

impl fmt::Display for RadioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPresent => write!(f, "radio not present"),
            Self::Firmware => write!(f, "radio firmware init failed"),
            Self::AuthRejected => write!(f, "authentication rejected"),
            Self::NoNetwork => write!(f, "network not found"),
            Self::Timeout => write!(f, "join timed out"),
        }
    }
}

/// Link-layer frame transport.
///
/// Both operations return immediately or after a bounded wait.
pub trait FrameTransport {
    /// Hardware address of the interface.
    fn mac_address(&self) -> MacAddress;

    /// Transmit a complete Ethernet frame.
    fn transmit(&mut self, frame: &[u8]) -> Result<(), TxError>;

    /// Receive one frame into `buffer`.
    ///
    /// Returns `Ok(Some(len))` when a frame was read, `Ok(None)` when no frame
    /// is available, or an error on failure.
    fn receive(&mut self, buffer: &mut [u8]) -> Result<Option<usize>, RxError>;
}

/// Status LED.
pub trait Led {
    /// LED on or off (no-op where the board has none).
    fn set_led(&mut self, on: bool);
}

/// A radio that can associate with an access point.
pub trait Radio: FrameTransport + Led {
    /// Power up the chip and load its firmware.
    fn init(&mut self) -> Result<(), RadioError>;

    /// Join a network. An empty passphrase joins an open network.
    fn join(&mut self, ssid: &str, passphrase: &str) -> Result<(), RadioError>;
}
