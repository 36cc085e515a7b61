//! Blocking-by-polling resolvers built on the stack's request/poll primitives.
//!
//! Both resolvers run on the caller's context: they start a request on the
//! shared stack, then sleep and poll a completion flag under a fixed
//! [`PollPolicy`](crate::time::PollPolicy) budget while the pump moves frames.

mod hardware;
mod name;

use core::fmt;

use crate::dns::Rcode;
use crate::error::NetworkError;

pub use hardware::AddressResolver;
pub use name::NameResolver;

/// Hardware address resolution failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Target is unspecified, broadcast or multicast.
    InvalidTarget,
    /// No reply within the polling budget.
    Timeout,
    /// The stack refused or failed the resolution.
    Stack(NetworkError),
}

impl ResolveError {
    pub fn description(&self) -> &'static str {
        match self {
            ResolveError::InvalidTarget => "invalid resolution target",
            ResolveError::Timeout => "resolution timed out",
            ResolveError::Stack(_) => "stack resolution error",
        }
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::Stack(e) => write!(f, "{}: {}", self.description(), e),
            _ => f.write_str(self.description()),
        }
    }
}

/// Name lookup failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    InvalidName,
    /// No name server is known (e.g. static fallback address).
    NoNameServer,
    /// The name server's hardware address could not be resolved.
    Resolve(ResolveError),
    /// The query could not be issued.
    Query(NetworkError),
    Timeout,
    /// The server answered with a non-success response code.
    Failed(Rcode),
    /// Successful response without any IPv4 answer.
    NoAddresses,
}

impl LookupError {
    pub fn description(&self) -> &'static str {
        match self {
            LookupError::InvalidName => "invalid host name",
            LookupError::NoNameServer => "no name server configured",
            LookupError::Resolve(_) => "name server unreachable",
            LookupError::Query(_) => "query could not be sent",
            LookupError::Timeout => "lookup timed out",
            LookupError::Failed(_) => "lookup failed",
            LookupError::NoAddresses => "no addresses in response",
        }
    }
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::Resolve(e) => write!(f, "{}: {}", self.description(), e),
            LookupError::Query(e) => write!(f, "{}: {}", self.description(), e),
            LookupError::Failed(rcode) => write!(f, "{}: {}", self.description(), rcode),
            _ => f.write_str(self.description()),
        }
    }
}

impl From<ResolveError> for LookupError {
    fn from(e: ResolveError) -> Self {
        LookupError::Resolve(e)
    }
}
