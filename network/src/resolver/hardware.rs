use alloc::sync::Arc;
use core::net::Ipv4Addr;

use spin::Mutex;

use super::ResolveError;
use crate::stack::ArpClient;
use crate::time::{PollPolicy, Sleeper};
use crate::types::MacAddress;

/// Resolves IPv4 addresses to hardware addresses, one at a time.
///
/// Every call aborts whatever resolution the stack still has pending, so a
/// superseded target can never deliver its answer.
pub struct AddressResolver<S, Z> {
    stack: Arc<Mutex<S>>,
    sleeper: Z,
    policy: PollPolicy,
}

impl<S: ArpClient, Z: Sleeper> AddressResolver<S, Z> {
    pub fn new(stack: Arc<Mutex<S>>, sleeper: Z) -> Self {
        Self::with_policy(stack, sleeper, PollPolicy::ARP)
    }

    pub fn with_policy(stack: Arc<Mutex<S>>, sleeper: Z, policy: PollPolicy) -> Self {
        Self { stack, sleeper, policy }
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    pub(crate) fn sleeper_mut(&mut self) -> &mut Z {
        &mut self.sleeper
    }

    pub(crate) fn stack(&self) -> &Arc<Mutex<S>> {
        &self.stack
    }

    pub fn resolve(&mut self, target: Ipv4Addr) -> Result<MacAddress, ResolveError> {
        if target.is_unspecified() || target.is_broadcast() || target.is_multicast() {
            return Err(ResolveError::InvalidTarget);
        }

        {
            let mut stack = self.stack.lock();
            stack.abort();
            stack.begin_resolve(target).map_err(ResolveError::Stack)?;
        }

        let stack = &self.stack;
        if !self.policy.wait(&mut self.sleeper, || stack.lock().is_done()) {
            log::warn!(target: "arp", "no reply from {}", target);
            return Err(ResolveError::Timeout);
        }

        let mac = self.stack.lock().result().map_err(ResolveError::Stack)?;
        log::debug!(target: "arp", "resolved {} -> {}", target, mac);
        Ok(mac)
    }
}
