//! Tether network stack
//!
//! Radio frame transport, smoltcp-backed protocol stack, on-demand ARP and
//! DNS resolvers, and the packet pump that moves frames between radio and
//! stack.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;

pub mod arp;
pub mod device;
pub mod dns;
pub mod error;
pub mod pump;
pub mod resolver;
pub mod stack;
pub mod time;
pub mod types;

pub use device::{FrameTransport, Led, Radio, RadioError, RxError, SharedDevice, TxError};
pub use error::{NetworkError, Result};
pub use pump::{Iteration, PacketPump, PumpConfig};
pub use resolver::{AddressResolver, LookupError, NameResolver, ResolveError};
pub use stack::{Lease, LeaseRequest, ListenError, ListenerConfig, PortStack, Stack, StackSettings};
pub use time::{Clock, PollPolicy, Sleeper};
pub use types::MacAddress;

#[cfg(feature = "std")]
pub use device::HostDevice;
#[cfg(feature = "std")]
pub use pump::spawn_pump;
#[cfg(feature = "std")]
pub use time::{host_millis, StdSleeper};
