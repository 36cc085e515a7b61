//! Status vocabulary and the bound-link summary.
//!
//! A [`StatusCode`] is what the status LED shows: its numeric value is the
//! number of blinks per cycle, so the declaration order is fixed.

use core::fmt;
use core::net::Ipv4Addr;

use tether_network::{Lease, MacAddress};

/// Bring-up and runtime outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum StatusCode {
    /// Left the guarded region without a terminal status.
    #[default]
    Unknown = 0,
    Ok = 1,
    /// Device capability unavailable.
    Device = 2,
    /// Namespace construction failed (reported by the served application).
    Namespace = 3,
    /// Connection accept failed (reported by the served application).
    Server = 4,
    /// Requested static address malformed.
    Ip = 5,
    /// Radio initialisation failed.
    Wifi = 6,
    /// Association failed after every attempt.
    Wpa2 = 7,
    /// Lease request could not be issued.
    Dhcp1 = 8,
    /// No lease and no static fallback.
    Dhcp2 = 9,
    Listen1 = 10,
    Listen2 = 11,
    /// Listen port malformed.
    Port = 12,
    /// Fault trapped by the top-level guard.
    Exception = 13,
}

impl StatusCode {
    pub const ALL: [StatusCode; 14] = [
        Self::Unknown,
        Self::Ok,
        Self::Device,
        Self::Namespace,
        Self::Server,
        Self::Ip,
        Self::Wifi,
        Self::Wpa2,
        Self::Dhcp1,
        Self::Dhcp2,
        Self::Listen1,
        Self::Listen2,
        Self::Port,
        Self::Exception,
    ];

    pub const fn value(self) -> u8 {
        self as u8
    }

    pub fn from_value(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Short display name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unknown => "UNK",
            Self::Ok => "OK",
            Self::Device => "DEV",
            Self::Namespace => "NS",
            Self::Server => "SRV",
            Self::Ip => "IP",
            Self::Wifi => "WIFI",
            Self::Wpa2 => "WPA2",
            Self::Dhcp1 => "DHCP1",
            Self::Dhcp2 => "DHCP2",
            Self::Listen1 => "LISTEN1",
            Self::Listen2 => "LISTEN2",
            Self::Port => "PORT",
            Self::Exception => "EXCP",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Unknown => "exited without terminal status",
            Self::Ok => "nominal",
            Self::Device => "device capability failure",
            Self::Namespace => "namespace construction failed",
            Self::Server => "connection accept failed",
            Self::Ip => "requested static address malformed",
            Self::Wifi => "radio initialisation failed",
            Self::Wpa2 => "radio association failed",
            Self::Dhcp1 => "lease request could not be issued",
            Self::Dhcp2 => "no lease and no static fallback",
            Self::Listen1 => "listener creation failed",
            Self::Listen2 => "listener activation failed",
            Self::Port => "listen port malformed",
            Self::Exception => "unrecoverable fault",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Network status after successful bring-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkStatus {
    /// Assigned IPv4 address.
    pub ip_address: Ipv4Addr,
    pub prefix_len: u8,
    pub gateway: Option<Ipv4Addr>,
    /// First DNS server announced by the lease.
    pub dns_server: Option<Ipv4Addr>,
    pub mac_address: MacAddress,
    /// Whether the address came from a lease or the static fallback.
    pub is_dhcp: bool,
}

impl NetworkStatus {
    pub fn from_lease(lease: &Lease, mac: MacAddress) -> Self {
        Self {
            ip_address: lease.address,
            prefix_len: lease.prefix_len,
            gateway: lease.gateway,
            dns_server: lease.dns_servers.first().copied(),
            mac_address: mac,
            is_dhcp: true,
        }
    }

    /// Static fallback: no gateway or name server is known.
    pub fn fallback(address: Ipv4Addr, prefix_len: u8, mac: MacAddress) -> Self {
        Self {
            ip_address: address,
            prefix_len,
            gateway: None,
            dns_server: None,
            mac_address: mac,
            is_dhcp: false,
        }
    }

    pub fn has_ip(&self) -> bool {
        !self.ip_address.is_unspecified()
    }
}

impl fmt::Display for NetworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({})", self.ip_address, self.prefix_len, self.mac_address)?;
        if let Some(gw) = self.gateway {
            write!(f, " gw {}", gw)?;
        }
        if let Some(dns) = self.dns_server {
            write!(f, " dns {}", dns)?;
        }
        if !self.is_dhcp {
            f.write_str(" static")?;
        }
        Ok(())
    }
}
