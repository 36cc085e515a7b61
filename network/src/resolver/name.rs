use alloc::string::ToString;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::net::Ipv4Addr;

use spin::Mutex;

use super::{AddressResolver, LookupError};
use crate::dns::{DnsQuery, HostName};
use crate::stack::{ArpClient, Lease, QueryClient};
use crate::time::{PollPolicy, Sleeper};

/// A record lookups against one name server.
///
/// One query per call, no caching and no query-level retry.
pub struct NameResolver<S, Z> {
    arp: AddressResolver<S, Z>,
    server: Ipv4Addr,
    policy: PollPolicy,
    next_id: u16,
}

impl<S, Z> NameResolver<S, Z>
where
    S: ArpClient + QueryClient,
    Z: Sleeper,
{
    pub fn new(stack: Arc<Mutex<S>>, sleeper: Z, server: Ipv4Addr) -> Self {
        Self {
            arp: AddressResolver::new(stack, sleeper),
            server,
            policy: PollPolicy::DNS,
            next_id: 1,
        }
    }

    /// Use the first name server the lease announced.
    pub fn from_lease(stack: Arc<Mutex<S>>, sleeper: Z, lease: &Lease) -> Result<Self, LookupError> {
        let server = *lease.dns_servers.first().ok_or(LookupError::NoNameServer)?;
        Ok(Self::new(stack, sleeper, server))
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn server(&self) -> Ipv4Addr {
        self.server
    }

    pub fn lookup(&mut self, name: &str) -> Result<Vec<Ipv4Addr>, LookupError> {
        let host = HostName::parse(name).map_err(|_| LookupError::InvalidName)?;

        let server_mac = self.arp.resolve(self.server)?;

        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        let query = DnsQuery {
            id,
            name: host.as_str().to_string(),
            server: self.server,
            server_mac,
            recursion_desired: true,
        };

        let stack = self.arp.stack().clone();
        stack.lock().start_query(&query).map_err(LookupError::Query)?;

        let mut response = None;
        let answered = self.policy.wait(self.arp.sleeper_mut(), || {
            response = stack.lock().poll_query();
            response.is_some()
        });
        let response = match response {
            Some(r) if answered => r,
            _ => {
                log::warn!(target: "dns", "{}: no answer from {}", host.as_str(), self.server);
                return Err(LookupError::Timeout);
            }
        };

        if !response.rcode.is_success() {
            log::warn!(target: "dns", "{}: {}", host.as_str(), response.rcode);
            return Err(LookupError::Failed(response.rcode));
        }
        let addrs = response.ipv4_addresses();
        if addrs.is_empty() {
            return Err(LookupError::NoAddresses);
        }
        log::info!(target: "dns", "{} -> {:?}", host.as_str(), addrs);
        Ok(addrs)
    }
}
