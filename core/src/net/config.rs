//! Bring-up configuration.

use alloc::string::String;
use core::net::Ipv4Addr;
use core::time::Duration;

use tether_network::{LeaseRequest, MacAddress, PollPolicy, StackSettings};

pub use tether_network::ListenerConfig;

use super::error::BringupError;

/// What the device joins and how it presents itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkConfig {
    /// Host name announced in the lease request.
    pub hostname: String,
    /// Lease hint, and the static address used when no lease arrives.
    pub requested_address: Option<String>,
    pub ssid: String,
    pub passphrase: String,
    pub tcp_ports: usize,
    pub udp_ports: usize,
}

impl LinkConfig {
    pub fn new(hostname: &str, ssid: &str, passphrase: &str) -> Self {
        Self {
            hostname: hostname.into(),
            requested_address: None,
            ssid: ssid.into(),
            passphrase: passphrase.into(),
            tcp_ports: 1,
            udp_ports: 0,
        }
    }

    pub fn requested_address(mut self, addr: &str) -> Self {
        self.requested_address = Some(addr.into());
        self
    }

    pub fn ports(mut self, tcp: usize, udp: usize) -> Self {
        self.tcp_ports = tcp;
        self.udp_ports = udp;
        self
    }

    /// Parse the requested address. An empty string counts as absent.
    pub fn validate_requested_address(&self) -> Result<Option<Ipv4Addr>, BringupError> {
        match self.requested_address.as_deref() {
            None | Some("") => Ok(None),
            Some(text) => text
                .parse::<Ipv4Addr>()
                .ok()
                .filter(|a| !a.is_unspecified() && !a.is_broadcast() && !a.is_multicast())
                .map(Some)
                .ok_or(BringupError::InvalidAddress),
        }
    }

    pub fn lease_request(&self, requested: Option<Ipv4Addr>) -> LeaseRequest {
        LeaseRequest {
            hostname: self.hostname.clone(),
            requested,
        }
    }

    /// Stack settings; one UDP port more than asked for, for the lease client.
    pub fn stack_settings(&self, mac: MacAddress) -> StackSettings {
        StackSettings {
            mac,
            udp_ports: self.udp_ports + 1,
            tcp_ports: self.tcp_ports,
        }
    }
}

/// Retry and timing budget of every bring-up stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BringupPolicy {
    pub join_attempts: u32,
    /// Pause between failed association attempts.
    pub join_backoff: Duration,
    pub lease_polls: u32,
    pub lease_poll_interval: Duration,
    /// Pause before touching the radio after power-up.
    pub radio_settle: Duration,
}

impl Default for BringupPolicy {
    fn default() -> Self {
        Self {
            join_attempts: 5,
            join_backoff: Duration::from_secs(5),
            lease_polls: 15,
            lease_poll_interval: Duration::from_millis(500),
            radio_settle: Duration::from_secs(2),
        }
    }
}

impl BringupPolicy {
    /// Short budgets for bench setups with a known-good access point.
    pub fn quick() -> Self {
        Self {
            join_attempts: 2,
            join_backoff: Duration::from_secs(1),
            lease_polls: 6,
            lease_poll_interval: Duration::from_millis(250),
            radio_settle: Duration::ZERO,
        }
    }

    pub fn join(mut self, attempts: u32, backoff: Duration) -> Self {
        self.join_attempts = attempts;
        self.join_backoff = backoff;
        self
    }

    pub fn lease(mut self, polls: u32, interval: Duration) -> Self {
        self.lease_polls = polls;
        self.lease_poll_interval = interval;
        self
    }

    pub fn settle(mut self, delay: Duration) -> Self {
        self.radio_settle = delay;
        self
    }

    pub(crate) fn lease_policy(&self) -> PollPolicy {
        PollPolicy::new(Duration::ZERO, self.lease_poll_interval, self.lease_polls)
    }
}

/// Parse a listen port. Zero and anything outside `u16` are rejected.
pub fn parse_port(text: &str) -> Result<u16, BringupError> {
    match text.trim().parse::<u16>() {
        Ok(0) | Err(_) => Err(BringupError::InvalidPort),
        Ok(port) => Ok(port),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::StatusCode;

    #[test]
    fn test_requested_address_parsing() {
        let cfg = LinkConfig::new("node", "ssid", "pw");
        assert_eq!(cfg.validate_requested_address(), Ok(None));
        assert_eq!(cfg.clone().requested_address("").validate_requested_address(), Ok(None));
        assert_eq!(
            cfg.clone().requested_address("192.0.2.5").validate_requested_address(),
            Ok(Some(Ipv4Addr::new(192, 0, 2, 5)))
        );
        for bad in ["192.0.2", "192.0.2.256", "not-an-ip", "0.0.0.0", "255.255.255.255"] {
            assert_eq!(
                cfg.clone().requested_address(bad).validate_requested_address(),
                Err(BringupError::InvalidAddress),
                "{}",
                bad
            );
        }
    }

    #[test]
    fn test_stack_gets_extra_udp_port() {
        let cfg = LinkConfig::new("node", "ssid", "pw").ports(2, 3);
        let settings = cfg.stack_settings(MacAddress::ZERO);
        assert_eq!(settings.udp_ports, 4);
        assert_eq!(settings.tcp_ports, 2);
    }

    #[test]
    fn test_default_policy_budgets() {
        let policy = BringupPolicy::default();
        assert_eq!(policy.join_attempts, 5);
        assert_eq!(policy.join_backoff, Duration::from_secs(5));
        assert_eq!(policy.lease_policy().budget(), Duration::from_millis(7500));
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port("564"), Ok(564));
        assert_eq!(parse_port(" 8080 "), Ok(8080));
        assert_eq!(parse_port("65535"), Ok(65535));
        for bad in ["", "0", "65536", "-1", "http"] {
            assert_eq!(parse_port(bad).map_err(|e| e.status()), Err(StatusCode::Port));
        }
    }

    #[test]
    fn test_listener_defaults() {
        let cfg = ListenerConfig::new(564);
        assert_eq!(cfg.max_connections, 3);
        assert_eq!(cfg.rx_buffer, 512);
        assert_eq!(cfg.tx_buffer, 512);
    }
}
