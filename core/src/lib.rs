//! Tether core
//!
//! Radio link bring-up, listener setup and status reporting on top of
//! `tether-network`. `no_std` + `alloc`; the `std` feature adds the host
//! listener and the unwinding top-level guard.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;

pub mod logger;
pub mod net;
pub mod report;

pub use net::{BringupError, LinkBringup, LinkConfig, StatusCode};
pub use report::{status_channel, StatusDisplay, StatusReporter};
#[cfg(feature = "std")]
pub use report::guard;
