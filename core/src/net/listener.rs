//! Listener setup per target.
//!
//! Failures come back as the status code to display (`Err(LISTEN1)`,
//! `Err(LISTEN2)`, ...); success is always `Ok`.

use alloc::sync::Arc;

use spin::Mutex;

use tether_network::stack::{LeaseClient, ListenError, StackSettings, TcpListen};
use tether_network::{Radio, Sleeper};

use super::config::ListenerConfig;
use super::error::BringupError;
use super::init::{BoundLink, LinkBringup};
use super::status::StatusCode;

impl From<ListenError> for BringupError {
    fn from(e: ListenError) -> Self {
        match e {
            ListenError::Create => BringupError::ListenerCreate,
            ListenError::Activate => BringupError::ListenerActivate,
        }
    }
}

/// Open a TCP listener on a bound link's stack.
pub fn listen_on<S: TcpListen>(link: &BoundLink<S>, config: &ListenerConfig) -> Result<S::Listener, StatusCode> {
    link.stack.lock().listen(config).map_err(|e| {
        let err = BringupError::from(e);
        log::error!(target: "listen", ":{}: {}", config.port, err);
        err.status()
    })
}

/// Bring the link up and listen on `port`.
///
/// Uses three sockets with 512-byte buffers each.
pub fn setup_listener<R, Z, S, F, L>(
    bringup: &mut LinkBringup<'_, R, Z>,
    make_stack: F,
    launch_pump: L,
    port: u16,
) -> Result<(BoundLink<S>, S::Listener), StatusCode>
where
    R: Radio,
    Z: Sleeper,
    S: LeaseClient + TcpListen,
    F: FnOnce(StackSettings) -> S,
    L: FnOnce(Arc<Mutex<S>>),
{
    let link = bringup.run(make_stack, launch_pump).map_err(|e| e.status())?;
    let listener = listen_on(&link, &ListenerConfig::new(port))?;
    Ok((link, listener))
}

/// Listener from the host's own TCP stack.
#[cfg(feature = "std")]
pub fn host_listener(
    device: &tether_network::HostDevice,
    port: u16,
) -> Result<std::net::TcpListener, StatusCode> {
    device.listen(port).map_err(|e| {
        log::error!(target: "listen", ":{}: {}", port, e);
        StatusCode::Listen1
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::config::LinkConfig;
    use crate::net::init::tests::{FakeLeaseStack, ScriptedRadio, TickSleeper};
    use core::net::Ipv4Addr;
    use tether_network::stack::{Lease, LeaseRequest};
    use tether_network::PortStack;

    /// Lease stack with a scripted listener outcome.
    struct ListeningStack {
        inner: FakeLeaseStack,
        outcome: Option<ListenError>,
        configs: alloc::vec::Vec<ListenerConfig>,
    }

    impl LeaseClient for ListeningStack {
        fn begin_lease(&mut self, request: &LeaseRequest) -> tether_network::Result<()> {
            self.inner.begin_lease(request)
        }
        fn lease(&self) -> Option<Lease> {
            self.inner.lease()
        }
        fn set_address(&mut self, addr: Ipv4Addr) -> tether_network::Result<()> {
            self.inner.set_address(addr)
        }
        fn address(&self) -> Option<Ipv4Addr> {
            self.inner.address()
        }
    }

    impl TcpListen for ListeningStack {
        type Listener = u16;
        type Connection = ();

        fn listen(&mut self, config: &ListenerConfig) -> Result<u16, ListenError> {
            self.configs.push(*config);
            match self.outcome {
                Some(e) => Err(e),
                None => Ok(config.port),
            }
        }

        fn accept(&mut self, _listener: &mut u16) -> Option<()> {
            None
        }
    }

    fn run(outcome: Option<ListenError>, requested: Option<&str>, lease_after: Option<u32>) -> Result<u16, StatusCode> {
        let mut radio = ScriptedRadio::default();
        let sleeper = TickSleeper::new();
        let ticks = sleeper.ticks.clone();
        let mut cfg = LinkConfig::new("tether", "lab", "pw");
        if let Some(addr) = requested {
            cfg = cfg.requested_address(addr);
        }
        let mut bringup = LinkBringup::new(&mut radio, sleeper, cfg);
        let (link, listener) = setup_listener(
            &mut bringup,
            |settings| ListeningStack {
                inner: FakeLeaseStack::new(settings, ticks, lease_after),
                outcome,
                configs: alloc::vec::Vec::new(),
            },
            |_| {},
            564,
        )?;
        let stack = link.stack.lock();
        assert_eq!(stack.configs.len(), 1);
        assert_eq!(stack.configs[0].max_connections, 3);
        Ok(listener)
    }

    #[test]
    fn test_listener_after_bound() {
        assert_eq!(run(None, None, Some(0)), Ok(564));
        assert_eq!(run(None, Some("192.0.2.5"), None), Ok(564));
    }

    #[test]
    fn test_listener_failures_map_to_status() {
        assert_eq!(run(Some(ListenError::Create), None, Some(0)), Err(StatusCode::Listen1));
        assert_eq!(run(Some(ListenError::Activate), None, Some(0)), Err(StatusCode::Listen2));
    }

    #[test]
    fn test_no_listener_without_lease() {
        assert_eq!(run(None, None, None), Err(StatusCode::Dhcp2));
        assert_eq!(run(None, Some("nonsense"), None), Err(StatusCode::Ip));
    }

    fn zero_clock() -> u64 {
        0
    }

    #[test]
    fn test_default_config_listens_on_port_stack() {
        let mut radio = ScriptedRadio::default();
        let cfg = LinkConfig::new("tether", "lab", "pw").requested_address("192.0.2.5");
        let mut bringup = LinkBringup::new(&mut radio, TickSleeper::new(), cfg);
        let (link, mut listener) = setup_listener(
            &mut bringup,
            |settings| PortStack::new(settings, zero_clock),
            |_| {},
            564,
        )
        .unwrap();

        assert_eq!(link.status_code(), StatusCode::Ok);
        assert_eq!(listener.port(), 564);
        assert_eq!(listener.handles().count(), 3);

        let mut stack = link.stack.lock();
        assert_eq!(stack.address(), Some(Ipv4Addr::new(192, 0, 2, 5)));
        assert!(stack.accept(&mut listener).is_none());
        // The single TCP port is now taken.
        assert_eq!(stack.listen(&ListenerConfig::new(565)).unwrap_err(), ListenError::Create);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_host_listener_bind_failure() {
        let device = tether_network::HostDevice::new();
        let first = host_listener(&device, 0).unwrap();
        let port = first.local_addr().unwrap().port();
        assert_eq!(host_listener(&device, port).err(), Some(StatusCode::Listen1));
    }
}
