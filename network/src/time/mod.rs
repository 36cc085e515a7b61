//! Time and timing module.
//!
//! Every wait in the crate is a fixed-duration sleep between polls; nothing
//! blocks on an event. [`Sleeper`] is the only suspension primitive and
//! [`PollPolicy`] the only retry loop.

mod timeout;

use core::time::Duration;

pub use timeout::PollPolicy;

/// Millisecond clock handed to the protocol stack.
pub type Clock = fn() -> u64;

/// Cooperative suspension of the calling context.
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

impl<S: Sleeper + ?Sized> Sleeper for &mut S {
    fn sleep(&mut self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Thread sleep on the host.
#[cfg(feature = "std")]
#[derive(Debug, Default, Clone, Copy)]
pub struct StdSleeper;

#[cfg(feature = "std")]
impl Sleeper for StdSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration)
    }
}

/// Milliseconds since the first call (host clock for the stack).
#[cfg(feature = "std")]
pub fn host_millis() -> u64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_millis() as u64
}
