//! Host device (for testing on a workstation).
//!
//! There is no radio and no link-layer access on the host: the LED is a
//! no-op and frame transfer is inert. Listeners come from the operating
//! system's own TCP stack instead of a bring-up.

use std::net::{Ipv4Addr, SocketAddrV4, TcpListener};

use super::{FrameTransport, Led, RxError, TxError};
use crate::types::MacAddress;

/// Host stand-in for a radio board.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostDevice;

impl HostDevice {
    pub fn new() -> Self {
        Self
    }

    /// Bind a TCP listener on all interfaces.
    pub fn listen(&self, port: u16) -> std::io::Result<TcpListener> {
        TcpListener::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port))
    }
}

impl Led for HostDevice {
    fn set_led(&mut self, _on: bool) {}
}

impl FrameTransport for HostDevice {
    fn mac_address(&self) -> MacAddress {
        MacAddress::ZERO
    }

    fn transmit(&mut self, _frame: &[u8]) -> Result<(), TxError> {
        Err(TxError::DeviceNotReady)
    }

    fn receive(&mut self, _buffer: &mut [u8]) -> Result<Option<usize>, RxError> {
        Ok(None)
    }
}
