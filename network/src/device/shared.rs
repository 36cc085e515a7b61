//! One radio, several owners.
//!
//! The pump thread needs frame access for the lifetime of the process while
//! bring-up and the status display borrow the same chip for association and
//! LED control. Every call takes the lock for exactly one operation.

use alloc::sync::Arc;
use spin::Mutex;

use super::{FrameTransport, Led, Radio, RadioError, RxError, TxError};
use crate::types::MacAddress;

/// Cloneable handle to a radio behind a spinlock.
pub struct SharedDevice<D> {
    inner: Arc<Mutex<D>>,
}

impl<D> SharedDevice<D> {
    pub fn new(device: D) -> Self {
        Self {
            inner: Arc::new(Mutex::new(device)),
        }
    }

    /// Run `f` with exclusive access to the device.
    pub fn with<R>(&self, f: impl FnOnce(&mut D) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

impl<D> Clone for SharedDevice<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: FrameTransport> FrameTransport for SharedDevice<D> {
    fn mac_address(&self) -> MacAddress {
        self.inner.lock().mac_address()
    }

    fn transmit(&mut self, frame: &[u8]) -> Result<(), TxError> {
        self.inner.lock().transmit(frame)
    }

    fn receive(&mut self, buffer: &mut [u8]) -> Result<Option<usize>, RxError> {
        self.inner.lock().receive(buffer)
    }
}

impl<D: Led> Led for SharedDevice<D> {
    fn set_led(&mut self, on: bool) {
        self.inner.lock().set_led(on)
    }
}

impl<D: Radio> Radio for SharedDevice<D> {
    fn init(&mut self) -> Result<(), RadioError> {
        self.inner.lock().init()
    }

    fn join(&mut self, ssid: &str, passphrase: &str) -> Result<(), RadioError> {
        self.inner.lock().join(ssid, passphrase)
    }
}
