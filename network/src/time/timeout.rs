//! Bounded polling.
//!
//! A settle delay after issuing a request, then a fixed number of
//! interval-spaced completion checks. The budget is deterministic: at most
//! `retries` sleeps of `interval` after the settle delay.

use core::time::Duration;

use super::Sleeper;

/// Settle delay, poll interval and retry budget for one wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Pause after the request is issued, before the first check.
    pub settle: Duration,
    /// Pause between two checks.
    pub interval: Duration,
    /// Number of interval sleeps before giving up.
    pub retries: u32,
}

impl PollPolicy {
    /// Hardware address resolution (~1 s).
    pub const ARP: Self = Self {
        settle: Duration::from_millis(4),
        interval: Duration::from_millis(50),
        retries: 20,
    };

    /// Name lookup (~2 s).
    pub const DNS: Self = Self {
        settle: Duration::from_millis(5),
        interval: Duration::from_millis(20),
        retries: 100,
    };

    /// Lease acquisition (~7.5 s).
    pub const LEASE: Self = Self {
        settle: Duration::ZERO,
        interval: Duration::from_millis(500),
        retries: 15,
    };

    pub const fn new(settle: Duration, interval: Duration, retries: u32) -> Self {
        Self {
            settle,
            interval,
            retries,
        }
    }

    /// Total time this policy may wait.
    pub fn budget(&self) -> Duration {
        self.settle + self.interval * self.retries
    }

    /// Wait until `ready` returns true or the budget is spent.
    ///
    /// Returns whether `ready` ever reported true.
    pub fn wait<S, F>(&self, sleeper: &mut S, mut ready: F) -> bool
    where
        S: Sleeper + ?Sized,
        F: FnMut() -> bool,
    {
        if !self.settle.is_zero() {
            sleeper.sleep(self.settle);
        }
        if ready() {
            return true;
        }
        for _ in 0..self.retries {
            sleeper.sleep(self.interval);
            if ready() {
                return true;
            }
        }
        false
    }
}
