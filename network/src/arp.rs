//! On-demand hardware address resolution.
//!
//! Tracks at most one outstanding ARP request. Starting a new resolution
//! replaces the previous one, so a late reply for a superseded target is
//! never reported. Request frames are built and replies parsed with the
//! `smoltcp::wire` ARP/Ethernet representations.
//!
//! # States
//! Idle → Requested → Waiting → Resolved

use core::net::Ipv4Addr;

use smoltcp::wire::{
    ArpOperation, ArpPacket, ArpRepr, EthernetAddress, EthernetFrame, EthernetProtocol,
    EthernetRepr, ETHERNET_HEADER_LEN,
};

use crate::error::{NetworkError, Result};
use crate::stack::{ipv4_from_wire, ipv4_to_wire};
use crate::types::MacAddress;

/// One outstanding resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingResolution {
    pub target: Ipv4Addr,
    pub resolved: Option<MacAddress>,
    /// Request frame still has to be handed to the radio.
    request_due: bool,
}

/// ARP request/reply bookkeeping for one stack.
#[derive(Debug, Default)]
pub struct ArpExchange {
    pending: Option<PendingResolution>,
}

impl ArpExchange {
    pub const fn new() -> Self {
        Self { pending: None }
    }

    /// Drop any outstanding resolution.
    pub fn abort(&mut self) {
        if let Some(p) = self.pending.take() {
            log::debug!(target: "arp", "abort resolution of {}", p.target);
        }
    }

    /// Start resolving `target`. Fails while another resolution is pending.
    pub fn begin(&mut self, target: Ipv4Addr) -> Result<()> {
        if target.is_unspecified() || target.is_broadcast() || target.is_multicast() {
            return Err(NetworkError::InvalidAddress);
        }
        if self.pending.is_some_and(|p| p.resolved.is_none()) {
            return Err(NetworkError::Busy);
        }
        self.pending = Some(PendingResolution {
            target,
            resolved: None,
            request_due: true,
        });
        Ok(())
    }

    pub fn pending(&self) -> Option<&PendingResolution> {
        self.pending.as_ref()
    }

    pub fn is_done(&self) -> bool {
        self.pending.is_some_and(|p| p.resolved.is_some())
    }

    pub fn result(&self) -> Result<MacAddress> {
        match self.pending {
            None => Err(NetworkError::NoResolution),
            Some(PendingResolution { resolved: None, .. }) => Err(NetworkError::Pending),
            Some(PendingResolution { resolved: Some(mac), .. }) => Ok(mac),
        }
    }

    /// Write the due request frame into `buf`, if any.
    ///
    /// Returns the frame length, or `None` when no request is due.
    pub fn take_request(
        &mut self,
        our_mac: MacAddress,
        our_ip: Ipv4Addr,
        buf: &mut [u8],
    ) -> Result<Option<usize>> {
        let pending = match self.pending.as_mut() {
            Some(p) if p.request_due => p,
            _ => return Ok(None),
        };

        let arp = ArpRepr::EthernetIpv4 {
            operation: ArpOperation::Request,
            source_hardware_addr: EthernetAddress(our_mac.0),
            source_protocol_addr: ipv4_to_wire(our_ip),
            target_hardware_addr: EthernetAddress([0; 6]),
            target_protocol_addr: ipv4_to_wire(pending.target),
        };
        let eth = EthernetRepr {
            src_addr: EthernetAddress(our_mac.0),
            dst_addr: EthernetAddress(MacAddress::BROADCAST.0),
            ethertype: EthernetProtocol::Arp,
        };

        let len = ETHERNET_HEADER_LEN + arp.buffer_len();
        if buf.len() < len {
            return Err(NetworkError::BufferTooSmall);
        }
        let mut frame = EthernetFrame::new_unchecked(&mut buf[..len]);
        eth.emit(&mut frame);
        arp.emit(&mut ArpPacket::new_unchecked(frame.payload_mut()));

        pending.request_due = false;
        log::debug!(target: "arp", "who-has {} tell {}", pending.target, our_ip);
        Ok(Some(len))
    }

    /// Inspect an inbound frame; records the answer if it is the reply we wait for.
    ///
    /// Returns true when the frame completed the pending resolution.
    pub fn observe(&mut self, frame: &[u8]) -> bool {
        let pending = match self.pending.as_mut() {
            Some(p) if p.resolved.is_none() => p,
            _ => return false,
        };
        let Ok(frame) = EthernetFrame::new_checked(frame) else {
            return false;
        };
        if frame.ethertype() != EthernetProtocol::Arp {
            return false;
        }
        let Ok(packet) = ArpPacket::new_checked(frame.payload()) else {
            return false;
        };
        match ArpRepr::parse(&packet) {
            Ok(ArpRepr::EthernetIpv4 {
                operation: ArpOperation::Reply,
                source_hardware_addr,
                source_protocol_addr,
                ..
            }) if ipv4_from_wire(source_protocol_addr) == pending.target => {
                let mac = MacAddress(source_hardware_addr.0);
                log::debug!(target: "arp", "{} is-at {}", pending.target, mac);
                pending.resolved = Some(mac);
                true
            }
            _ => false,
        }
    }
}

/// Build an ARP reply frame (used by tests and loopback peers).
pub fn build_reply(
    from_mac: MacAddress,
    from_ip: Ipv4Addr,
    to_mac: MacAddress,
    to_ip: Ipv4Addr,
    buf: &mut [u8],
) -> Result<usize> {
    let arp = ArpRepr::EthernetIpv4 {
        operation: ArpOperation::Reply,
        source_hardware_addr: EthernetAddress(from_mac.0),
        source_protocol_addr: ipv4_to_wire(from_ip),
        target_hardware_addr: EthernetAddress(to_mac.0),
        target_protocol_addr: ipv4_to_wire(to_ip),
    };
    let eth = EthernetRepr {
        src_addr: EthernetAddress(from_mac.0),
        dst_addr: EthernetAddress(to_mac.0),
        ethertype: EthernetProtocol::Arp,
    };
    let len = ETHERNET_HEADER_LEN + arp.buffer_len();
    if buf.len() < len {
        return Err(NetworkError::BufferTooSmall);
    }
    let mut frame = EthernetFrame::new_unchecked(&mut buf[..len]);
    eth.emit(&mut frame);
    arp.emit(&mut ArpPacket::new_unchecked(frame.payload_mut()));
    Ok(len)
}
