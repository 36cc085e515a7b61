//! Log ring buffer.
//!
//! Circular buffer of formatted log lines that a status console (or a
//! debugger) can drain after a failed bring-up.
//!
//! # Design
//!
//! - Fixed-size, no heap allocation for the buffer
//! - Single producer, single consumer, behind one spin lock
//! - Overwrites oldest entries when full
//! - Each entry records the stage it came from and whether it is an error

use spin::Mutex;

/// Maximum message length in bytes
pub const LOG_MSG_LEN: usize = 96;

/// Number of entries in the ring buffer
pub const LOG_RING_SIZE: usize = 32;

/// Stage identifiers for log categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Stage {
    /// Radio init and association
    Wifi = 0,
    /// Lease acquisition and static fallback
    Dhcp = 1,
    Arp = 2,
    Dns = 3,
    /// Packet pump
    Pump = 4,
    /// Listener setup
    Listen = 5,
    /// Status display and guard
    Status = 6,
    /// Anything else
    General = 7,
}

impl Stage {
    /// Get human-readable stage name
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Wifi => "WIFI",
            Self::Dhcp => "DHCP",
            Self::Arp => "ARP",
            Self::Dns => "DNS",
            Self::Pump => "PUMP",
            Self::Listen => "LISTEN",
            Self::Status => "STATUS",
            Self::General => "INIT",
        }
    }

    /// Map a `log` target to its stage.
    pub fn from_target(target: &str) -> Self {
        match target {
            "wifi" => Self::Wifi,
            "dhcp" => Self::Dhcp,
            "arp" => Self::Arp,
            "dns" => Self::Dns,
            "pump" => Self::Pump,
            "listen" => Self::Listen,
            "status" => Self::Status,
            _ => Self::General,
        }
    }
}

/// Single log entry in the ring buffer
#[derive(Clone, Copy)]
pub struct LogEntry {
    pub msg: [u8; LOG_MSG_LEN],
    /// Actual message length
    pub len: u8,
    pub stage: Stage,
    /// True if this is an error, false if just a debug/info log
    pub is_error: bool,
}

impl LogEntry {
    const EMPTY: Self = Self {
        msg: [0u8; LOG_MSG_LEN],
        len: 0,
        stage: Stage::General,
        is_error: false,
    };

    pub fn new(stage: Stage, msg: &str, is_error: bool) -> Self {
        let mut entry = Self::EMPTY;
        entry.stage = stage;
        entry.is_error = is_error;
        let copy_len = truncate_at_char(msg, LOG_MSG_LEN);
        entry.msg[..copy_len].copy_from_slice(&msg.as_bytes()[..copy_len]);
        entry.len = copy_len as u8;
        entry
    }

    /// Get message as string slice
    pub fn message(&self) -> &str {
        let len = (self.len as usize).min(LOG_MSG_LEN);
        core::str::from_utf8(&self.msg[..len]).unwrap_or("<invalid utf8>")
    }

    /// Format entry for display: "[STAGE] message" or "[ERR STAGE] message"
    pub fn format(&self, buf: &mut [u8]) -> usize {
        let prefix = if self.is_error { "ERR " } else { "" };
        let parts = ["[", prefix, self.stage.name(), "] ", self.message()];

        let mut pos = 0;
        for &b in parts.iter().flat_map(|p| p.as_bytes()) {
            if pos >= buf.len() {
                break;
            }
            buf[pos] = b;
            pos += 1;
        }
        pos
    }
}

impl Default for LogEntry {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl core::fmt::Debug for LogEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LogEntry")
            .field("stage", &self.stage)
            .field("is_error", &self.is_error)
            .field("msg", &self.message())
            .finish()
    }
}

/// Longest prefix of `s` no longer than `max` bytes that ends on a char boundary.
fn truncate_at_char(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    end
}

/// Overwrite-oldest ring of log entries.
pub struct Ring {
    entries: [LogEntry; LOG_RING_SIZE],
    /// Total entries ever written.
    written: usize,
    /// Total entries ever consumed (or skipped).
    read: usize,
}

impl Ring {
    pub const fn new() -> Self {
        Self {
            entries: [LogEntry::EMPTY; LOG_RING_SIZE],
            written: 0,
            read: 0,
        }
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.entries[self.written % LOG_RING_SIZE] = entry;
        self.written = self.written.wrapping_add(1);
    }

    /// Pop the oldest entry still held.
    pub fn pop(&mut self) -> Option<LogEntry> {
        if self.read >= self.written {
            return None;
        }
        // Entries older than one ring length were overwritten.
        if self.written - self.read > LOG_RING_SIZE {
            self.read = self.written - LOG_RING_SIZE;
        }
        let entry = self.entries[self.read % LOG_RING_SIZE];
        self.read += 1;
        Some(entry)
    }

    pub fn available(&self) -> usize {
        self.written.saturating_sub(self.read).min(LOG_RING_SIZE)
    }

    /// Total entries ever written (for overflow detection)
    pub fn count(&self) -> usize {
        self.written
    }

    pub fn clear(&mut self) {
        self.read = self.written;
    }
}

impl Default for Ring {
    fn default() -> Self {
        Self::new()
    }
}

static RING: Mutex<Ring> = Mutex::new(Ring::new());

pub(crate) fn push_entry(entry: LogEntry) {
    RING.lock().push(entry);
}

/// Pop the oldest entry from the ring buffer
pub fn log_pop() -> Option<LogEntry> {
    RING.lock().pop()
}

/// Check how many entries are available to read
pub fn log_available() -> usize {
    RING.lock().available()
}

/// Get total number of entries ever written
pub fn log_count() -> usize {
    RING.lock().count()
}

/// Clear the ring buffer
pub fn log_clear() {
    RING.lock().clear();
}
