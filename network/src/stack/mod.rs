//! Protocol stack capabilities and the smoltcp-backed implementation.
//!
//! The orchestration code never talks to smoltcp directly. It sees the
//! stack through the small capability traits below, which lets tests
//! substitute a scripted stack.
//!
//! # Components
//!
//! - [`StagingDevice`] - queues frames between the pump and smoltcp
//! - [`PortStack`] - interface, sockets, lease client, ARP exchange, DNS

mod adapter;
mod interface;

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::net::Ipv4Addr;
use core::time::Duration;

use smoltcp::wire::Ipv4Address;

use crate::dns::{DnsQuery, DnsResponse};
use crate::error::Result;
use crate::types::MacAddress;

pub use adapter::{StagingDevice, QUEUE_DEPTH};
pub use interface::{PortStack, TcpListener, DNS_CLIENT_PORT, STATIC_PREFIX_LEN};

pub(crate) fn ipv4_to_wire(addr: Ipv4Addr) -> Ipv4Address {
    Ipv4Address(addr.octets())
}

pub(crate) fn ipv4_from_wire(addr: Ipv4Address) -> Ipv4Addr {
    Ipv4Addr::from(addr.0)
}

/// Parameters fixed when the stack is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackSettings {
    pub mac: MacAddress,
    /// UDP socket budget, lease client included.
    pub udp_ports: usize,
    pub tcp_ports: usize,
}

/// What the lease client announces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaseRequest {
    pub hostname: String,
    pub requested: Option<Ipv4Addr>,
}

/// An acquired lease.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lease {
    pub address: Ipv4Addr,
    pub prefix_len: u8,
    pub gateway: Option<Ipv4Addr>,
    pub dns_servers: Vec<Ipv4Addr>,
    pub lease_duration: Option<Duration>,
    pub renewal: Option<Duration>,
}

/// TCP listener parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerConfig {
    pub port: u16,
    pub max_connections: usize,
    pub rx_buffer: usize,
    pub tx_buffer: usize,
}

impl ListenerConfig {
    pub const fn new(port: u16) -> Self {
        Self {
            port,
            max_connections: 3,
            rx_buffer: 512,
            tx_buffer: 512,
        }
    }
}

/// Listener setup failure, split by the phase that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenError {
    /// Sockets could not be allocated.
    Create,
    /// Sockets exist but could not start listening.
    Activate,
}

impl fmt::Display for ListenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenError::Create => write!(f, "listener creation failed"),
            ListenError::Activate => write!(f, "listener activation failed"),
        }
    }
}

/// Frame exchange with the radio side.
pub trait FrameStack {
    /// Hand one inbound frame to the stack.
    fn receive_frame(&mut self, frame: &[u8]) -> Result<()>;

    /// Produce the next outbound frame into `buf`. Returns 0 when there is nothing to send.
    fn emit_frame(&mut self, buf: &mut [u8]) -> Result<usize>;
}

/// Address lease client.
pub trait LeaseClient {
    fn begin_lease(&mut self, request: &LeaseRequest) -> Result<()>;

    /// The lease, once one has been acquired.
    fn lease(&self) -> Option<Lease>;

    /// Configure `addr` directly, bypassing the lease client.
    fn set_address(&mut self, addr: Ipv4Addr) -> Result<()>;

    fn address(&self) -> Option<Ipv4Addr>;
}

/// Single outstanding hardware address resolution.
pub trait ArpClient {
    fn abort(&mut self);
    fn begin_resolve(&mut self, target: Ipv4Addr) -> Result<()>;
    fn is_done(&self) -> bool;
    fn result(&self) -> Result<MacAddress>;
}

/// One DNS exchange at a time.
pub trait QueryClient {
    fn start_query(&mut self, query: &DnsQuery) -> Result<()>;

    /// Take the response to the outstanding query, if it has arrived.
    fn poll_query(&mut self) -> Option<DnsResponse>;
}

/// Stack-level TCP listening.
pub trait TcpListen {
    type Listener;
    type Connection;

    fn listen(&mut self, config: &ListenerConfig) -> core::result::Result<Self::Listener, ListenError>;

    /// Next newly established connection on `listener`. Closed sockets are re-armed.
    fn accept(&mut self, listener: &mut Self::Listener) -> Option<Self::Connection>;
}

/// Everything the link orchestration needs from a protocol stack.
pub trait Stack: FrameStack + LeaseClient + ArpClient + QueryClient + TcpListen {}

impl<T> Stack for T where T: FrameStack + LeaseClient + ArpClient + QueryClient + TcpListen {}
