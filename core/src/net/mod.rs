//! Link bring-up orchestration.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Application                                    │
//! │  setup_listener(), reports status, serves connections       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │              tether_core::net (this module)                 │
//! │  LinkBringup, listener setup, status vocabulary, log ring   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!         ┌────────────────────┼────────────────────┐
//!         ▼                    ▼                    ▼
//!       Radio             PortStack            PacketPump
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use tether_core::net::{LinkBringup, LinkConfig, setup_listener};
//! use tether_network::{PacketPump, PortStack, PumpConfig, SharedDevice, spawn_pump};
//!
//! let radio = SharedDevice::new(board_radio);
//! let mut handle = radio.clone();
//! let config = LinkConfig::new("tether", SSID, PASSPHRASE).requested_address("192.0.2.5");
//! let mut bringup = LinkBringup::new(&mut handle, StdSleeper, config);
//! let (link, listener) = setup_listener(
//!     &mut bringup,
//!     |settings| PortStack::new(settings, host_millis),
//!     |stack| { spawn_pump(PacketPump::<_, _, _>::new(radio, stack, StdSleeper, PumpConfig::default())).ok(); },
//!     564,
//! )?;
//! ```

mod config;
mod error;
mod init;
mod listener;
pub mod ring_buffer;
mod status;

pub use config::{parse_port, BringupPolicy, LinkConfig, ListenerConfig};
pub use error::{BringupError, BringupResult};
pub use init::{BoundLink, LinkBringup, LinkState};
pub use listener::{listen_on, setup_listener};
#[cfg(feature = "std")]
pub use listener::host_listener;
pub use ring_buffer::{
    log_available, log_clear, log_count, log_pop, LogEntry, Stage,
};
pub use status::{NetworkStatus, StatusCode};
