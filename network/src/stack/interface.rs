//! smoltcp-backed protocol stack.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                  PortStack                   │
//! │  lease client · ARP exchange · DNS · TCP     │
//! └──────────────────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────┐
//! │           smoltcp::iface::Interface          │
//! └──────────────────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────┐
//! │      StagingDevice (rx / tx frame queues)    │
//! └──────────────────────────────────────────────┘
//!                       ▲
//!                       │ receive_frame / emit_frame
//!                  PacketPump
//! ```
//!
//! The pump feeds inbound frames through [`FrameStack::receive_frame`] and
//! drains outbound ones with [`FrameStack::emit_frame`]; both drive
//! `Interface::poll`, so the stack only advances while the pump runs.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::net::Ipv4Addr;

use smoltcp::iface::{Config, Interface, SocketHandle, SocketSet};
use smoltcp::socket::dhcpv4::{Event as DhcpEvent, Socket as DhcpSocket};
use smoltcp::socket::tcp::{Socket as TcpSocket, SocketBuffer as TcpSocketBuffer, State as TcpState};
use smoltcp::socket::udp::{PacketBuffer, PacketMetadata, Socket as UdpSocket};
use smoltcp::time::Instant;
use smoltcp::wire::{
    DhcpMessageType, DhcpOption, DhcpPacket, DhcpRepr, EthernetAddress, EthernetFrame, EthernetProtocol,
    IpAddress, IpCidr, IpEndpoint, IpProtocol, Ipv4Cidr, Ipv4Packet, UdpPacket,
};

use super::adapter::StagingDevice;
use super::{
    ipv4_from_wire, ipv4_to_wire, ArpClient, FrameStack, Lease, LeaseClient, LeaseRequest,
    ListenError, ListenerConfig, QueryClient, StackSettings, TcpListen,
};
use crate::arp::ArpExchange;
use crate::dns::{decode_response, encode_query, DnsQuery, DnsResponse, HostName, DNS_PORT};
use crate::error::{NetworkError, Result};
use crate::time::Clock;
use crate::types::MacAddress;

/// Local port of the DNS client socket.
pub const DNS_CLIENT_PORT: u16 = 50053;

/// Prefix length applied to a statically configured address.
pub const STATIC_PREFIX_LEN: u8 = 24;

const DHCP_OPTION_HOSTNAME: u8 = 12;
const DHCP_OPTION_REQUESTED_IP: u8 = 50;
const DHCP_SERVER_PORT: u16 = 67;
const DHCP_CLIENT_PORT: u16 = 68;
const UDP_PACKET_SLOTS: usize = 4;
const UDP_BUFFER_SIZE: usize = 1536;
const DNS_MESSAGE_MAX: usize = 512;

/// Listening sockets created by [`TcpListen::listen`].
#[derive(Debug)]
pub struct TcpListener {
    port: u16,
    /// Socket handle and whether its current connection was handed out.
    sockets: Vec<(SocketHandle, bool)>,
}

impl TcpListener {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn handles(&self) -> impl Iterator<Item = SocketHandle> + '_ {
        self.sockets.iter().map(|(h, _)| *h)
    }
}

/// Outgoing DHCP options for one lease request.
///
/// The socket borrows its options for its whole life, so they are leaked
/// once and reused while the request stays the same.
struct LeaseOptions {
    request: LeaseRequest,
    /// While discovering: hostname plus the requested-address hint.
    discover: &'static [DhcpOption<'static>],
    /// After an offer: hostname only. The client then names the offered
    /// address itself.
    select: &'static [DhcpOption<'static>],
}

impl LeaseOptions {
    fn build(request: &LeaseRequest) -> Self {
        let mut select = Vec::new();
        if !request.hostname.is_empty() {
            let name: &'static [u8] = Box::leak(Box::<[u8]>::from(request.hostname.as_bytes()));
            select.push(DhcpOption { kind: DHCP_OPTION_HOSTNAME, data: name });
        }
        let mut discover = select.clone();
        if let Some(addr) = request.requested {
            let octets: &'static [u8] = Box::leak(Box::new(addr.octets()));
            discover.push(DhcpOption { kind: DHCP_OPTION_REQUESTED_IP, data: octets });
        }
        Self {
            request: request.clone(),
            discover: discover.leak(),
            select: select.leak(),
        }
    }
}

/// True for a DHCP OFFER addressed to the client port.
fn is_dhcp_offer(frame: &[u8]) -> bool {
    let Ok(eth) = EthernetFrame::new_checked(frame) else {
        return false;
    };
    if eth.ethertype() != EthernetProtocol::Ipv4 {
        return false;
    }
    let Ok(ip) = Ipv4Packet::new_checked(eth.payload()) else {
        return false;
    };
    if ip.next_header() != IpProtocol::Udp {
        return false;
    }
    let Ok(udp) = UdpPacket::new_checked(ip.payload()) else {
        return false;
    };
    if udp.src_port() != DHCP_SERVER_PORT || udp.dst_port() != DHCP_CLIENT_PORT {
        return false;
    }
    let Ok(dhcp) = DhcpPacket::new_checked(udp.payload()) else {
        return false;
    };
    matches!(DhcpRepr::parse(&dhcp), Ok(repr) if repr.message_type == DhcpMessageType::Offer)
}

/// Full IP stack over the staging device.
pub struct PortStack {
    device: StagingDevice,
    iface: Interface,
    sockets: SocketSet<'static>,
    mac: MacAddress,
    clock: Clock,
    dhcp_handle: Option<SocketHandle>,
    lease_options: Option<LeaseOptions>,
    /// The DHCP socket is sending the requested-address hint.
    lease_hinting: bool,
    dns_handle: Option<SocketHandle>,
    /// Id of the query still waiting for a response.
    dns_pending: Option<u16>,
    dns_answer: Option<DnsResponse>,
    arp: ArpExchange,
    lease: Option<Lease>,
    udp_budget: usize,
    udp_used: usize,
    tcp_budget: usize,
    tcp_used: usize,
}

impl PortStack {
    pub fn new(settings: StackSettings, clock: Clock) -> Self {
        let mut device = StagingDevice::new();
        let config = Config::new(EthernetAddress(settings.mac.0).into());
        let now = Instant::from_millis(clock() as i64);
        let iface = Interface::new(config, &mut device, now);

        log::debug!(
            target: "dhcp",
            "stack up: mac {} udp {} tcp {}",
            settings.mac,
            settings.udp_ports,
            settings.tcp_ports
        );

        Self {
            device,
            iface,
            sockets: SocketSet::new(vec![]),
            mac: settings.mac,
            clock,
            dhcp_handle: None,
            lease_options: None,
            lease_hinting: false,
            dns_handle: None,
            dns_pending: None,
            dns_answer: None,
            arp: ArpExchange::new(),
            lease: None,
            udp_budget: settings.udp_ports,
            udp_used: 0,
            tcp_budget: settings.tcp_ports,
            tcp_used: 0,
        }
    }

    pub fn mac_address(&self) -> MacAddress {
        self.mac
    }

    pub fn device(&self) -> &StagingDevice {
        &self.device
    }

    /// Advance the interface and collect socket events.
    ///
    /// Returns `true` if any socket activity occurred.
    pub fn poll(&mut self) -> bool {
        let now = Instant::from_millis((self.clock)() as i64);
        let activity = self.iface.poll(now, &mut self.device, &mut self.sockets);
        self.poll_dhcp();
        self.poll_dns();
        activity
    }

    pub fn tcp_socket_mut(&mut self, handle: SocketHandle) -> &mut TcpSocket<'static> {
        self.sockets.get_mut::<TcpSocket>(handle)
    }

    /// Point the DHCP socket at the discover or the select option set.
    fn apply_lease_options(&mut self, hint: bool) {
        let (Some(handle), Some(options)) = (self.dhcp_handle, &self.lease_options) else {
            return;
        };
        let set = if hint { options.discover } else { options.select };
        self.sockets.get_mut::<DhcpSocket>(handle).set_outgoing_options(set);
        self.lease_hinting = hint && options.request.requested.is_some();
    }

    fn claim_udp(&mut self) -> Result<()> {
        if self.udp_used >= self.udp_budget {
            return Err(NetworkError::PortExhausted);
        }
        self.udp_used += 1;
        Ok(())
    }

    fn poll_dhcp(&mut self) {
        let Some(handle) = self.dhcp_handle else {
            return;
        };
        match self.sockets.get_mut::<DhcpSocket>(handle).poll() {
            Some(DhcpEvent::Configured(config)) => {
                let cidr = config.address;
                let router = config.router;
                let dns_servers: Vec<Ipv4Addr> =
                    config.dns_servers.iter().copied().map(ipv4_from_wire).collect();

                self.iface.update_ip_addrs(|addrs| {
                    addrs.clear();
                    addrs.push(IpCidr::Ipv4(cidr)).ok();
                });
                if let Some(router) = router {
                    self.iface.routes_mut().add_default_ipv4_route(router).ok();
                }

                let lease = Lease {
                    address: ipv4_from_wire(cidr.address()),
                    prefix_len: cidr.prefix_len(),
                    gateway: router.map(ipv4_from_wire),
                    dns_servers,
                    lease_duration: None,
                    renewal: None,
                };
                log::info!(target: "dhcp", "bound {}/{}", lease.address, lease.prefix_len);
                self.lease = Some(lease);
            }
            Some(DhcpEvent::Deconfigured) => {
                log::warn!(target: "dhcp", "lease lost");
                self.iface.update_ip_addrs(|addrs| addrs.clear());
                self.iface.routes_mut().remove_default_ipv4_route();
                self.lease = None;
                self.apply_lease_options(true);
            }
            None => {}
        }
    }

    fn poll_dns(&mut self) {
        let Some(handle) = self.dns_handle else {
            return;
        };
        let mut buf = [0u8; UDP_BUFFER_SIZE];
        loop {
            let socket = self.sockets.get_mut::<UdpSocket>(handle);
            if !socket.can_recv() {
                break;
            }
            match socket.recv_slice(&mut buf) {
                Ok((len, _)) => self.accept_dns_message(&buf[..len]),
                Err(_) => break,
            }
        }
    }

    /// Record `msg` as the answer if it responds to the outstanding query.
    fn accept_dns_message(&mut self, msg: &[u8]) {
        let Ok(response) = decode_response(msg) else {
            log::debug!(target: "dns", "undecodable response ignored");
            return;
        };
        if self.dns_pending != Some(response.id) {
            log::debug!(target: "dns", "stray response id {:#06x}", response.id);
            return;
        }
        self.dns_pending = None;
        self.dns_answer = Some(response);
    }
}

impl FrameStack for PortStack {
    fn receive_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.arp.observe(frame);
        // The hint must not follow the DISCOVER into the REQUEST.
        if self.lease_hinting && is_dhcp_offer(frame) {
            log::debug!(target: "dhcp", "offer received, dropping address hint");
            self.apply_lease_options(false);
        }
        self.device.push_rx(frame);
        self.poll();
        Ok(())
    }

    fn emit_frame(&mut self, buf: &mut [u8]) -> Result<usize> {
        let our_ip = self.address().unwrap_or(Ipv4Addr::UNSPECIFIED);
        if let Some(len) = self.arp.take_request(self.mac, our_ip, buf)? {
            return Ok(len);
        }

        self.poll();
        match self.device.pop_tx() {
            Some(frame) if frame.len() > buf.len() => Err(NetworkError::BufferTooSmall),
            Some(frame) => {
                buf[..frame.len()].copy_from_slice(&frame);
                Ok(frame.len())
            }
            None => Ok(0),
        }
    }
}

impl LeaseClient for PortStack {
    fn begin_lease(&mut self, request: &LeaseRequest) -> Result<()> {
        if self.dhcp_handle.is_some() {
            return Err(NetworkError::Busy);
        }
        self.claim_udp()?;

        let options = match self.lease_options.take() {
            Some(options) if options.request == *request => options,
            _ => LeaseOptions::build(request),
        };
        self.lease_options = Some(options);
        self.dhcp_handle = Some(self.sockets.add(DhcpSocket::new()));
        self.apply_lease_options(true);

        log::info!(
            target: "dhcp",
            "lease request as {:?} (preferred {:?})",
            request.hostname,
            request.requested
        );
        Ok(())
    }

    fn lease(&self) -> Option<Lease> {
        self.lease.clone()
    }

    fn set_address(&mut self, addr: Ipv4Addr) -> Result<()> {
        if addr.is_unspecified() || addr.is_broadcast() || addr.is_multicast() {
            return Err(NetworkError::InvalidAddress);
        }
        if let Some(handle) = self.dhcp_handle.take() {
            self.lease_hinting = false;
            self.sockets.remove(handle);
            self.udp_used = self.udp_used.saturating_sub(1);
        }

        let cidr = Ipv4Cidr::new(ipv4_to_wire(addr), STATIC_PREFIX_LEN);
        let mut pushed = false;
        self.iface.update_ip_addrs(|addrs| {
            addrs.clear();
            pushed = addrs.push(IpCidr::Ipv4(cidr)).is_ok();
        });
        if !pushed {
            return Err(NetworkError::DeviceError("address table full".into()));
        }
        log::info!(target: "dhcp", "static address {}/{}", addr, STATIC_PREFIX_LEN);
        Ok(())
    }

    fn address(&self) -> Option<Ipv4Addr> {
        self.iface.ipv4_addr().map(ipv4_from_wire)
    }
}

impl ArpClient for PortStack {
    fn abort(&mut self) {
        self.arp.abort();
    }

    fn begin_resolve(&mut self, target: Ipv4Addr) -> Result<()> {
        self.arp.begin(target)
    }

    fn is_done(&self) -> bool {
        self.arp.is_done()
    }

    fn result(&self) -> Result<MacAddress> {
        self.arp.result()
    }
}

impl QueryClient for PortStack {
    fn start_query(&mut self, query: &DnsQuery) -> Result<()> {
        let name = HostName::parse(&query.name)?;
        let mut msg = [0u8; DNS_MESSAGE_MAX];
        let len = encode_query(query.id, &name, query.recursion_desired, &mut msg)?;

        let handle = match self.dns_handle {
            Some(handle) => handle,
            None => {
                self.claim_udp()?;
                let rx = PacketBuffer::new(
                    vec![PacketMetadata::EMPTY; UDP_PACKET_SLOTS],
                    vec![0u8; UDP_BUFFER_SIZE],
                );
                let tx = PacketBuffer::new(
                    vec![PacketMetadata::EMPTY; UDP_PACKET_SLOTS],
                    vec![0u8; UDP_BUFFER_SIZE],
                );
                let mut socket = UdpSocket::new(rx, tx);
                socket
                    .bind(DNS_CLIENT_PORT)
                    .map_err(|_| NetworkError::SocketFailed)?;
                let handle = self.sockets.add(socket);
                self.dns_handle = Some(handle);
                handle
            }
        };

        let server = IpEndpoint::new(IpAddress::Ipv4(ipv4_to_wire(query.server)), DNS_PORT);
        self.sockets
            .get_mut::<UdpSocket>(handle)
            .send_slice(&msg[..len], server)
            .map_err(|_| NetworkError::SendFailed)?;

        self.dns_pending = Some(query.id);
        self.dns_answer = None;
        log::debug!(
            target: "dns",
            "query {:#06x} {} via {} ({})",
            query.id,
            name.as_str(),
            query.server,
            query.server_mac
        );
        Ok(())
    }

    fn poll_query(&mut self) -> Option<DnsResponse> {
        self.dns_answer.take()
    }
}

impl TcpListen for PortStack {
    type Listener = TcpListener;
    type Connection = SocketHandle;

    fn listen(&mut self, config: &ListenerConfig) -> core::result::Result<TcpListener, ListenError> {
        // The budget counts listening ports; connection sockets share one.
        if config.max_connections == 0 || self.tcp_used >= self.tcp_budget {
            return Err(ListenError::Create);
        }

        let mut handles = Vec::with_capacity(config.max_connections);
        for _ in 0..config.max_connections {
            let rx = TcpSocketBuffer::new(vec![0u8; config.rx_buffer]);
            let tx = TcpSocketBuffer::new(vec![0u8; config.tx_buffer]);
            handles.push(self.sockets.add(TcpSocket::new(rx, tx)));
        }
        self.tcp_used += 1;

        for &handle in &handles {
            if self.sockets.get_mut::<TcpSocket>(handle).listen(config.port).is_err() {
                for &h in &handles {
                    self.sockets.remove(h);
                }
                self.tcp_used -= 1;
                return Err(ListenError::Activate);
            }
        }

        log::info!(target: "listen", "tcp :{} x{}", config.port, handles.len());
        Ok(TcpListener {
            port: config.port,
            sockets: handles.into_iter().map(|h| (h, false)).collect(),
        })
    }

    fn accept(&mut self, listener: &mut TcpListener) -> Option<SocketHandle> {
        let port = listener.port;
        for (handle, handed_out) in listener.sockets.iter_mut() {
            let socket = self.sockets.get_mut::<TcpSocket>(*handle);
            match socket.state() {
                TcpState::Closed => {
                    *handed_out = false;
                    if socket.listen(port).is_err() {
                        log::warn!(target: "listen", "re-arm on :{} failed", port);
                    }
                }
                TcpState::Listen => *handed_out = false,
                TcpState::Established if !*handed_out => {
                    *handed_out = true;
                    return Some(*handle);
                }
                _ => {}
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arp::build_reply;
    use alloc::string::String;

    const MAC: MacAddress = MacAddress::new([0x02, 0, 0, 0, 0, 0x01]);

    fn zero_clock() -> u64 {
        0
    }

    fn stack(udp: usize, tcp: usize) -> PortStack {
        PortStack::new(StackSettings { mac: MAC, udp_ports: udp, tcp_ports: tcp }, zero_clock)
    }

    #[test]
    fn test_static_address() {
        let mut s = stack(2, 1);
        assert_eq!(s.address(), None);
        s.set_address(Ipv4Addr::new(192, 168, 4, 20)).unwrap();
        assert_eq!(s.address(), Some(Ipv4Addr::new(192, 168, 4, 20)));
        assert!(s.lease().is_none());
        assert_eq!(s.set_address(Ipv4Addr::BROADCAST), Err(NetworkError::InvalidAddress));
    }

    #[test]
    fn test_idle_stack_emits_nothing() {
        let mut s = stack(2, 1);
        let mut buf = [0u8; 1514];
        assert_eq!(s.emit_frame(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_arp_round_trip_through_frames() {
        let ours = Ipv4Addr::new(192, 168, 4, 20);
        let peer_ip = Ipv4Addr::new(192, 168, 4, 1);
        let peer_mac = MacAddress::new([0x02, 0, 0, 0, 0, 0x42]);

        let mut s = stack(2, 1);
        s.set_address(ours).unwrap();
        s.begin_resolve(peer_ip).unwrap();

        let mut buf = [0u8; 1514];
        let len = s.emit_frame(&mut buf).unwrap();
        assert_eq!(len, 42);
        assert_eq!(&buf[28..32], &ours.octets());
        assert!(!s.is_done());

        let mut reply = [0u8; 64];
        let n = build_reply(peer_mac, peer_ip, MAC, ours, &mut reply).unwrap();
        s.receive_frame(&reply[..n]).unwrap();
        assert!(s.is_done());
        assert_eq!(s.result(), Ok(peer_mac));
    }

    /// Offset of the first DHCP option in an Ethernet/IPv4/UDP frame.
    const DHCP_OPTIONS_AT: usize = 14 + 20 + 8 + 240;

    fn dhcp_options(frame: &[u8]) -> Vec<(u8, Vec<u8>)> {
        let mut out = Vec::new();
        let mut i = DHCP_OPTIONS_AT;
        while i < frame.len() {
            match frame[i] {
                0 => i += 1,
                255 => break,
                kind => {
                    let len = frame[i + 1] as usize;
                    out.push((kind, frame[i + 2..i + 2 + len].to_vec()));
                    i += 2 + len;
                }
            }
        }
        out
    }

    fn option(frame: &[u8], kind: u8) -> Vec<Vec<u8>> {
        dhcp_options(frame)
            .into_iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, data)| data)
            .collect()
    }

    fn checksum(data: &[u8], mut acc: u32) -> u16 {
        for chunk in data.chunks(2) {
            let hi = chunk[0];
            let lo = chunk.get(1).copied().unwrap_or(0);
            acc += u32::from(u16::from_be_bytes([hi, lo]));
        }
        while acc > 0xffff {
            acc = (acc & 0xffff) + (acc >> 16);
        }
        !(acc as u16)
    }

    /// Broadcast DHCP OFFER of `yiaddr` from `server` for transaction `xid`.
    fn offer_frame(xid: [u8; 4], client: MacAddress, yiaddr: Ipv4Addr, server: Ipv4Addr) -> Vec<u8> {
        let mut dhcp = vec![0u8; 240];
        dhcp[0] = 2;
        dhcp[1] = 1;
        dhcp[2] = 6;
        dhcp[4..8].copy_from_slice(&xid);
        dhcp[16..20].copy_from_slice(&yiaddr.octets());
        dhcp[20..24].copy_from_slice(&server.octets());
        dhcp[28..34].copy_from_slice(&client.0);
        dhcp[236..240].copy_from_slice(&[99, 130, 83, 99]);
        dhcp.extend_from_slice(&[53, 1, 2]);
        dhcp.extend_from_slice(&[54, 4]);
        dhcp.extend_from_slice(&server.octets());
        dhcp.extend_from_slice(&[1, 4, 255, 255, 255, 0]);
        dhcp.extend_from_slice(&[51, 4, 0, 0, 0x0e, 0x10]);
        dhcp.push(255);

        let udp_len = (8 + dhcp.len()) as u16;
        let mut udp = Vec::new();
        udp.extend_from_slice(&67u16.to_be_bytes());
        udp.extend_from_slice(&68u16.to_be_bytes());
        udp.extend_from_slice(&udp_len.to_be_bytes());
        udp.extend_from_slice(&[0, 0]);
        udp.extend_from_slice(&dhcp);
        let mut pseudo = Vec::new();
        pseudo.extend_from_slice(&server.octets());
        pseudo.extend_from_slice(&Ipv4Addr::BROADCAST.octets());
        pseudo.extend_from_slice(&[0, 17]);
        pseudo.extend_from_slice(&udp_len.to_be_bytes());
        let pseudo_sum: u32 = pseudo
            .chunks(2)
            .map(|c| u32::from(u16::from_be_bytes([c[0], c[1]])))
            .sum();
        let sum = match checksum(&udp, pseudo_sum) {
            0 => 0xffff,
            sum => sum,
        };
        udp[6..8].copy_from_slice(&sum.to_be_bytes());

        let total = (20 + udp.len()) as u16;
        let mut ip = vec![0x45, 0];
        ip.extend_from_slice(&total.to_be_bytes());
        ip.extend_from_slice(&[0, 0, 0, 0, 64, 17, 0, 0]);
        ip.extend_from_slice(&server.octets());
        ip.extend_from_slice(&Ipv4Addr::BROADCAST.octets());
        let sum = checksum(&ip, 0);
        ip[10..12].copy_from_slice(&sum.to_be_bytes());

        let mut frame = Vec::new();
        frame.extend_from_slice(&MacAddress::BROADCAST.0);
        frame.extend_from_slice(&[0x02, 0, 0, 0, 0, 0x67]);
        frame.extend_from_slice(&[0x08, 0x00]);
        frame.extend_from_slice(&ip);
        frame.extend_from_slice(&udp);
        frame
    }

    fn hinted_request() -> LeaseRequest {
        LeaseRequest {
            hostname: String::from("tether"),
            requested: Some(Ipv4Addr::new(192, 0, 2, 5)),
        }
    }

    #[test]
    fn test_lease_request_emits_discover() {
        let mut s = stack(2, 1);
        s.begin_lease(&hinted_request()).unwrap();
        assert_eq!(
            s.begin_lease(&LeaseRequest::default()),
            Err(NetworkError::Busy)
        );

        let mut buf = [0u8; 1514];
        let len = s.emit_frame(&mut buf).unwrap();
        assert!(len > DHCP_OPTIONS_AT);
        assert_eq!(&buf[12..14], &[0x08, 0x00]);
        assert_eq!(u16::from_be_bytes([buf[36], buf[37]]), 67);

        let frame = &buf[..len];
        assert_eq!(option(frame, 53), vec![vec![1]]);
        assert_eq!(option(frame, 12), vec![b"tether".to_vec()]);
        assert_eq!(option(frame, 50), vec![vec![192, 0, 2, 5]]);
    }

    #[test]
    fn test_discover_without_hint_has_no_requested_address() {
        let mut s = stack(2, 1);
        s.begin_lease(&LeaseRequest { hostname: String::from("tether"), requested: None })
            .unwrap();
        let mut buf = [0u8; 1514];
        let len = s.emit_frame(&mut buf).unwrap();
        assert!(option(&buf[..len], 50).is_empty());
    }

    #[test]
    fn test_request_after_offer_names_offered_address_once() {
        let mut s = stack(2, 1);
        s.begin_lease(&hinted_request()).unwrap();

        let mut buf = [0u8; 1514];
        let len = s.emit_frame(&mut buf).unwrap();
        assert_eq!(option(&buf[..len], 53), vec![vec![1]]);
        let mut xid = [0u8; 4];
        xid.copy_from_slice(&buf[42 + 4..42 + 8]);

        let offered = Ipv4Addr::new(192, 0, 2, 77);
        let offer = offer_frame(xid, MAC, offered, Ipv4Addr::new(192, 0, 2, 1));
        assert!(is_dhcp_offer(&offer));
        s.receive_frame(&offer).unwrap();
        assert!(!s.lease_hinting);

        let len = s.emit_frame(&mut buf).unwrap();
        let frame = &buf[..len];
        assert_eq!(option(frame, 53), vec![vec![3]]);
        assert_eq!(option(frame, 50), vec![offered.octets().to_vec()]);
        assert_eq!(option(frame, 12), vec![b"tether".to_vec()]);
    }

    #[test]
    fn test_lease_options_reused_for_same_request() {
        let mut s = stack(2, 1);
        s.begin_lease(&hinted_request()).unwrap();
        let first = s.lease_options.as_ref().unwrap().discover.as_ptr();

        s.set_address(Ipv4Addr::new(192, 0, 2, 5)).unwrap();
        assert!(!s.lease_hinting);
        s.begin_lease(&hinted_request()).unwrap();
        assert!(s.lease_hinting);
        let second = s.lease_options.as_ref().unwrap().discover.as_ptr();
        assert!(core::ptr::eq(first, second));
    }

    #[test]
    fn test_query_goes_to_resolved_server_mac() {
        let ours = Ipv4Addr::new(192, 168, 4, 20);
        let server = Ipv4Addr::new(192, 168, 4, 1);
        let server_mac = MacAddress::new([0x02, 0, 0, 0, 0, 0x53]);

        let mut s = stack(2, 1);
        s.set_address(ours).unwrap();
        s.begin_resolve(server).unwrap();
        let mut buf = [0u8; 1514];
        assert_eq!(s.emit_frame(&mut buf).unwrap(), 42);
        let mut reply = [0u8; 64];
        let n = build_reply(server_mac, server, MAC, ours, &mut reply).unwrap();
        s.receive_frame(&reply[..n]).unwrap();
        assert_eq!(s.result(), Ok(server_mac));

        let query = DnsQuery {
            id: 7,
            name: String::from("printer.lan"),
            server,
            server_mac,
            recursion_desired: true,
        };
        s.start_query(&query).unwrap();

        // The neighbor entry came from the same reply, so no second ARP.
        let len = s.emit_frame(&mut buf).unwrap();
        assert!(len > 42);
        assert_eq!(&buf[0..6], &server_mac.0);
        assert_eq!(&buf[12..14], &[0x08, 0x00]);
        assert_eq!(u16::from_be_bytes([buf[36], buf[37]]), DNS_PORT);
    }

    #[test]
    fn test_lease_needs_udp_budget() {
        let mut s = stack(0, 1);
        assert_eq!(
            s.begin_lease(&LeaseRequest::default()),
            Err(NetworkError::PortExhausted)
        );
    }

    #[test]
    fn test_listen_respects_budget() {
        let mut s = stack(1, 0);
        assert_eq!(s.listen(&ListenerConfig::new(80)).unwrap_err(), ListenError::Create);

        let mut s = stack(1, 1);
        let mut listener = s.listen(&ListenerConfig::new(80)).unwrap();
        assert_eq!(listener.port(), 80);
        assert_eq!(listener.handles().count(), 3);
        assert!(s.accept(&mut listener).is_none());
        for h in listener.handles().collect::<Vec<_>>() {
            assert_eq!(s.tcp_socket_mut(h).state(), TcpState::Listen);
        }

        // One listening port, however many connections it accepts.
        assert_eq!(s.listen(&ListenerConfig::new(81)).unwrap_err(), ListenError::Create);

        let mut s = stack(1, 2);
        s.listen(&ListenerConfig::new(80)).unwrap();
        s.listen(&ListenerConfig::new(81)).unwrap();
    }

    #[test]
    fn test_listen_rejects_zero_connections() {
        let mut s = stack(1, 1);
        let config = ListenerConfig { max_connections: 0, ..ListenerConfig::new(80) };
        assert_eq!(s.listen(&config).unwrap_err(), ListenError::Create);
        assert!(s.listen(&ListenerConfig::new(80)).is_ok());
    }

    #[test]
    fn test_dns_answer_matched_by_id() {
        let mut s = stack(2, 1);
        s.dns_pending = Some(0x1234);

        let mut stray = [0u8; 12];
        stray[0..2].copy_from_slice(&0x9999u16.to_be_bytes());
        stray[2] = 0x81;
        s.accept_dns_message(&stray);
        assert!(s.poll_query().is_none());

        let mut reply = stray;
        reply[0..2].copy_from_slice(&0x1234u16.to_be_bytes());
        s.accept_dns_message(&reply);
        let response = s.poll_query().unwrap();
        assert_eq!(response.id, 0x1234);
        assert!(s.poll_query().is_none());
    }
}
