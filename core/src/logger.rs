//! `log` backend that writes into the ring buffer.
//!
//! Records are rendered into a fixed line buffer (no allocation) and
//! stored with the stage derived from the record target. Anything longer
//! than one entry is cut off.

use core::fmt::{self, Write};

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

use crate::net::ring_buffer::{push_entry, LogEntry, Stage, LOG_MSG_LEN};

/// Global ring logger.
pub struct RingLogger;

static LOGGER: RingLogger = RingLogger;

/// Install the ring logger as the `log` backend.
pub fn install(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}

impl Log for RingLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut line = LineBuf::new();
        // Overflow just truncates.
        let _ = write!(line, "{}", record.args());
        push_entry(LogEntry::new(
            Stage::from_target(record.target()),
            line.as_str(),
            record.level() == Level::Error,
        ));
    }

    fn flush(&self) {}
}

/// Fixed-capacity line buffer.
struct LineBuf {
    buf: [u8; LOG_MSG_LEN],
    len: usize,
}

impl LineBuf {
    const fn new() -> Self {
        Self {
            buf: [0; LOG_MSG_LEN],
            len: 0,
        }
    }

    fn as_str(&self) -> &str {
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or("")
    }
}

impl Write for LineBuf {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = LOG_MSG_LEN - self.len;
        let mut take = s.len().min(room);
        while !s.is_char_boundary(take) {
            take -= 1;
        }
        self.buf[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
        if take < s.len() {
            Err(fmt::Error)
        } else {
            Ok(())
        }
    }
}
