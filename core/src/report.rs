//! Status reporting.
//!
//! The process has one current [`StatusCode`] plus a repeat counter. The
//! owner sets it through a [`StatusReporter`]; a [`StatusDisplay`] on its
//! own context picks up the latest update and blinks it on the LED. The
//! channel holds one update: a newer one overwrites an unread older one.
//!
//! Blink pattern per cycle: a 5 s pause, then one long blink (1000/300 ms)
//! per five units while more than five remain, then short blinks
//! (150/150 ms) for the rest. `OK` is one short blink; `UNK` is dark.

use alloc::sync::Arc;
use core::time::Duration;

use spin::Mutex;

use tether_network::{Led, Sleeper};

use crate::net::StatusCode;

const CYCLE_PAUSE: Duration = Duration::from_secs(5);
const LONG_ON: Duration = Duration::from_millis(1000);
const LONG_OFF: Duration = Duration::from_millis(300);
const SHORT_ON: Duration = Duration::from_millis(150);
const SHORT_OFF: Duration = Duration::from_millis(150);

/// One status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusUpdate {
    pub code: StatusCode,
    /// Cycles to show before reverting to OK; 0 shows until replaced.
    pub repeat: u32,
}

type Mailbox = Arc<Mutex<Option<StatusUpdate>>>;

/// Create a connected reporter/receiver pair. Both start at OK.
pub fn status_channel() -> (StatusReporter, StatusReceiver) {
    let mailbox: Mailbox = Arc::new(Mutex::new(None));
    (
        StatusReporter {
            mailbox: mailbox.clone(),
            current: StatusCode::Ok,
        },
        StatusReceiver { mailbox },
    )
}

/// Producer side; remembers the last code it set.
pub struct StatusReporter {
    mailbox: Mailbox,
    current: StatusCode,
}

impl StatusReporter {
    pub fn set(&mut self, code: StatusCode, repeat: u32) {
        self.current = code;
        *self.mailbox.lock() = Some(StatusUpdate { code, repeat });
        if code.is_ok() {
            log::info!(target: "status", "{}", code);
        } else {
            log::warn!(target: "status", "{} ({}) x{}", code, code.description(), repeat);
        }
    }

    pub fn current(&self) -> StatusCode {
        self.current
    }

    /// Record an unrecoverable fault unless a failure was already reported.
    pub fn trap_fault(&mut self) -> StatusCode {
        if self.current.is_ok() {
            self.set(StatusCode::Exception, 0);
        }
        self.current
    }

    /// Leaving the guarded region while still OK means nobody set a terminal status.
    pub fn finish(&mut self) -> StatusCode {
        if self.current.is_ok() {
            self.set(StatusCode::Unknown, 0);
        }
        self.current
    }
}

/// Consumer side.
pub struct StatusReceiver {
    mailbox: Mailbox,
}

impl StatusReceiver {
    /// Take the latest unread update.
    pub fn try_recv(&self) -> Option<StatusUpdate> {
        self.mailbox.lock().take()
    }
}

/// Blinks the current status on an LED.
pub struct StatusDisplay<L, Z> {
    receiver: StatusReceiver,
    led: L,
    sleeper: Z,
    current: StatusCode,
    /// Cycles left before reverting to OK; `None` = until replaced.
    remaining: Option<u32>,
}

impl<L: Led, Z: Sleeper> StatusDisplay<L, Z> {
    pub fn new(receiver: StatusReceiver, led: L, sleeper: Z) -> Self {
        Self {
            receiver,
            led,
            sleeper,
            current: StatusCode::Ok,
            remaining: None,
        }
    }

    pub fn current(&self) -> StatusCode {
        self.current
    }

    /// One display cycle.
    pub fn cycle(&mut self) {
        self.sleeper.sleep(CYCLE_PAUSE);

        if let Some(update) = self.receiver.try_recv() {
            self.current = update.code;
            self.remaining = (update.repeat > 0).then_some(update.repeat);
        }

        let mut units = self.current.value();
        while units > 5 {
            self.blink(LONG_ON, LONG_OFF);
            units -= 5;
        }
        for _ in 0..units {
            self.blink(SHORT_ON, SHORT_OFF);
        }

        if let Some(n) = self.remaining {
            if n <= 1 {
                self.current = StatusCode::Ok;
                self.remaining = None;
            } else {
                self.remaining = Some(n - 1);
            }
        }
    }

    pub fn run(&mut self) -> ! {
        loop {
            self.cycle();
        }
    }

    fn blink(&mut self, on: Duration, off: Duration) {
        self.led.set_led(true);
        self.sleeper.sleep(on);
        self.led.set_led(false);
        self.sleeper.sleep(off);
    }
}

/// Run `f` as the process's guarded region.
///
/// A panic escaping `f` becomes EXCP unless a failure status was already
/// set; returning normally while still OK becomes UNK. Returns the final
/// status.
#[cfg(feature = "std")]
pub fn guard<F>(reporter: &mut StatusReporter, f: F) -> StatusCode
where
    F: FnOnce(&mut StatusReporter),
{
    use std::panic::{catch_unwind, AssertUnwindSafe};

    match catch_unwind(AssertUnwindSafe(|| f(reporter))) {
        Ok(()) => reporter.finish(),
        Err(cause) => {
            let msg = cause
                .downcast_ref::<&str>()
                .copied()
                .or_else(|| cause.downcast_ref::<String>().map(String::as_str))
                .unwrap_or("<non-string panic>");
            log::error!(target: "status", "EXCP: {}", msg);
            reporter.trap_fault()
        }
    }
}
