//! Staging device between the packet pump and smoltcp.
//!
//! The pump owns the radio, so smoltcp never touches hardware. Inbound
//! frames are pushed into the rx queue; frames smoltcp wants to send are
//! parked in the tx queue until the pump collects them.

use alloc::collections::VecDeque;
use alloc::vec;
use alloc::vec::Vec;

use smoltcp::phy::{Device, DeviceCapabilities, Medium, RxToken, TxToken};
use smoltcp::time::Instant;

use crate::types::MTU;

/// Frames held per direction before back-pressure applies.
pub const QUEUE_DEPTH: usize = 8;

/// Bounded frame queues exposed to smoltcp as a `phy::Device`.
#[derive(Debug, Default)]
pub struct StagingDevice {
    rx: VecDeque<Vec<u8>>,
    tx: VecDeque<Vec<u8>>,
    rx_overruns: u32,
}

impl StagingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an inbound frame. The oldest frame is dropped when full.
    pub fn push_rx(&mut self, frame: &[u8]) {
        if self.rx.len() >= QUEUE_DEPTH {
            self.rx.pop_front();
            self.rx_overruns = self.rx_overruns.wrapping_add(1);
        }
        self.rx.push_back(frame.to_vec());
    }

    /// Take the next frame smoltcp produced.
    pub fn pop_tx(&mut self) -> Option<Vec<u8>> {
        self.tx.pop_front()
    }

    pub fn rx_pending(&self) -> usize {
        self.rx.len()
    }

    pub fn tx_pending(&self) -> usize {
        self.tx.len()
    }

    pub fn rx_overruns(&self) -> u32 {
        self.rx_overruns
    }
}

impl Device for StagingDevice {
    type RxToken<'a> = StagedRx where Self: 'a;
    type TxToken<'a> = StagedTx<'a> where Self: 'a;

    fn capabilities(&self) -> DeviceCapabilities {
        let mut caps = DeviceCapabilities::default();
        caps.max_transmission_unit = MTU;
        caps.medium = Medium::Ethernet;
        caps
    }

    fn receive(&mut self, _timestamp: Instant) -> Option<(Self::RxToken<'_>, Self::TxToken<'_>)> {
        let frame = self.rx.pop_front()?;
        Some((StagedRx { frame }, StagedTx { queue: &mut self.tx }))
    }

    fn transmit(&mut self, _timestamp: Instant) -> Option<Self::TxToken<'_>> {
        if self.tx.len() >= QUEUE_DEPTH {
            return None;
        }
        Some(StagedTx { queue: &mut self.tx })
    }
}

pub struct StagedRx {
    frame: Vec<u8>,
}

impl RxToken for StagedRx {
    fn consume<R, F>(mut self, f: F) -> R
    where
        F: FnOnce(&mut [u8]) -> R,
    {
        f(&mut self.frame)
    }
}

pub struct StagedTx<'a> {
    queue: &'a mut VecDeque<Vec<u8>>,
}

impl<'a> TxToken for StagedTx<'a> {
    fn consume<R, F>(self, len: usize, f: F) -> R
    where
        F: FnOnce(&mut [u8]) -> R,
    {
        let mut frame = vec![0u8; len];
        let result = f(&mut frame);
        self.queue.push_back(frame);
        result
    }
}
