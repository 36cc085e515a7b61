//! DNS message types, host name validation and the wire codec.

mod packet;

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::net::Ipv4Addr;

use crate::error::{NetworkError, Result};
use crate::types::MacAddress;

pub use packet::{decode_response, encode_query};

/// Well-known DNS server port.
pub const DNS_PORT: u16 = 53;

/// Record type A (IPv4 host address).
pub const TYPE_A: u16 = 1;

/// Class IN.
pub const CLASS_IN: u16 = 1;

const MAX_NAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// A host name that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostName<'a>(&'a str);

impl<'a> HostName<'a> {
    /// Validate `name`. A single trailing dot is accepted and ignored.
    pub fn parse(name: &'a str) -> Result<Self> {
        let trimmed = name.strip_suffix('.').unwrap_or(name);
        if trimmed.is_empty() || trimmed.len() > MAX_NAME_LEN {
            return Err(NetworkError::InvalidName);
        }
        for label in trimmed.split('.') {
            if !valid_label(label) {
                return Err(NetworkError::InvalidName);
            }
        }
        Ok(Self(trimmed))
    }

    pub fn as_str(&self) -> &'a str {
        self.0
    }

    pub fn labels(&self) -> impl Iterator<Item = &'a str> {
        self.0.split('.')
    }
}

fn valid_label(label: &str) -> bool {
    if label.is_empty() || label.len() > MAX_LABEL_LEN {
        return false;
    }
    if label.starts_with('-') || label.ends_with('-') {
        return false;
    }
    label
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// DNS response code (low four bits of the header flags).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rcode(pub u8);

impl Rcode {
    pub const NO_ERROR: Self = Self(0);
    pub const FORMAT_ERROR: Self = Self(1);
    pub const SERVER_FAILURE: Self = Self(2);
    pub const NAME_ERROR: Self = Self(3);
    pub const NOT_IMPLEMENTED: Self = Self(4);
    pub const REFUSED: Self = Self(5);

    pub const fn is_success(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Rcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::NO_ERROR => write!(f, "NOERROR"),
            Self::FORMAT_ERROR => write!(f, "FORMERR"),
            Self::SERVER_FAILURE => write!(f, "SERVFAIL"),
            Self::NAME_ERROR => write!(f, "NXDOMAIN"),
            Self::NOT_IMPLEMENTED => write!(f, "NOTIMP"),
            Self::REFUSED => write!(f, "REFUSED"),
            Rcode(other) => write!(f, "RCODE{}", other),
        }
    }
}

/// One outgoing A query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsQuery {
    pub id: u16,
    pub name: String,
    pub server: Ipv4Addr,
    /// Hardware address resolved for `server` before the query was built.
    pub server_mac: MacAddress,
    pub recursion_desired: bool,
}

/// One resource record from the answer section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub rtype: u16,
    pub class: u16,
    pub ttl: u32,
    pub data: Vec<u8>,
}

/// Decoded response header and answer section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsResponse {
    pub id: u16,
    pub rcode: Rcode,
    pub answers: Vec<Answer>,
}

impl DnsResponse {
    /// Every answer whose data has the 4-byte IPv4 form, in response order.
    pub fn ipv4_addresses(&self) -> Vec<Ipv4Addr> {
        self.answers
            .iter()
            .filter_map(|a| <[u8; 4]>::try_from(a.data.as_slice()).ok())
            .map(Ipv4Addr::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_host_name_rules() {
        assert!(HostName::parse("example.com").is_ok());
        assert!(HostName::parse("example.com.").is_ok());
        assert!(HostName::parse("_srv.my-host.lan").is_ok());
        assert!(HostName::parse("localhost").is_ok());

        assert_eq!(HostName::parse(""), Err(NetworkError::InvalidName));
        assert_eq!(HostName::parse("."), Err(NetworkError::InvalidName));
        assert_eq!(HostName::parse("a..b"), Err(NetworkError::InvalidName));
        assert_eq!(HostName::parse("-bad.com"), Err(NetworkError::InvalidName));
        assert_eq!(HostName::parse("bad-.com"), Err(NetworkError::InvalidName));
        assert_eq!(HostName::parse("sp ace.com"), Err(NetworkError::InvalidName));

        let long_label = "a".repeat(64);
        assert_eq!(HostName::parse(&long_label), Err(NetworkError::InvalidName));
        let long_name = ["abcdefghi"; 26].join(".");
        assert!(long_name.len() > 253);
        assert_eq!(HostName::parse(&long_name), Err(NetworkError::InvalidName));
    }

    #[test]
    fn test_trailing_dot_stripped() {
        let name = HostName::parse("host.lan.").unwrap();
        assert_eq!(name.as_str(), "host.lan");
        assert_eq!(name.labels().count(), 2);
    }

    #[test]
    fn test_ipv4_addresses_skip_other_forms() {
        let response = DnsResponse {
            id: 1,
            rcode: Rcode::NO_ERROR,
            answers: vec![
                Answer { rtype: 5, class: CLASS_IN, ttl: 60, data: vec![3, b'f', b'o', b'o', 0] },
                Answer { rtype: TYPE_A, class: CLASS_IN, ttl: 60, data: vec![10, 0, 0, 1] },
                Answer { rtype: TYPE_A, class: CLASS_IN, ttl: 60, data: vec![10, 0, 0, 2] },
            ],
        };
        assert_eq!(
            response.ipv4_addresses(),
            vec![Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2)]
        );
    }

    #[test]
    fn test_rcode_display() {
        assert_eq!(alloc::format!("{}", Rcode::NAME_ERROR), "NXDOMAIN");
        assert_eq!(alloc::format!("{}", Rcode(9)), "RCODE9");
        assert!(Rcode::NO_ERROR.is_success());
        assert!(!Rcode::REFUSED.is_success());
    }
}
