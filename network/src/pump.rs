//! Steady-state frame pump between the radio and the protocol stack.
//!
//! Each iteration drains one inbound frame, fills empty outbound slots from
//! the stack, then transmits every populated slot. A slot whose transmit
//! fails keeps its frame and is retried on later iterations until its retry
//! budget is spent, at which point the frame is dropped. Frame order across
//! retries is not preserved.
//!
//! ```text
//!   radio ──receive──▶ stack.receive_frame
//!   stack.emit_frame ──▶ [slot 0][slot 1][slot 2] ──transmit──▶ radio
//! ```

use alloc::sync::Arc;
use core::time::Duration;

use spin::Mutex;

use crate::device::FrameTransport;
use crate::stack::FrameStack;
use crate::time::Sleeper;
use crate::types::MTU;

/// Default number of outbound slots.
pub const DEFAULT_SLOTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpConfig {
    /// Failed attempts tolerated before a frame is dropped.
    pub max_retries: u32,
    /// Pause when an iteration saw no traffic in either direction.
    pub idle: Duration,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            idle: Duration::from_millis(51),
        }
    }
}

/// Outcome of one [`PacketPump::step`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Iteration {
    pub rx_activity: bool,
    /// Frames sent successfully.
    pub transmitted: usize,
    pub dropped: usize,
    pub idled: bool,
}

struct FrameSlot {
    buf: [u8; MTU],
    /// 0 = empty.
    len: usize,
    retries: u32,
}

impl FrameSlot {
    const EMPTY: Self = Self {
        buf: [0; MTU],
        len: 0,
        retries: 0,
    };

    fn clear(&mut self) {
        self.len = 0;
        self.retries = 0;
    }
}

pub struct PacketPump<T, S, Z, const N: usize = DEFAULT_SLOTS> {
    transport: T,
    stack: Arc<Mutex<S>>,
    sleeper: Z,
    config: PumpConfig,
    slots: [FrameSlot; N],
    rx_buf: [u8; MTU],
    drops: u64,
}

impl<T, S, Z, const N: usize> PacketPump<T, S, Z, N>
where
    T: FrameTransport,
    S: FrameStack,
    Z: Sleeper,
{
    pub fn new(transport: T, stack: Arc<Mutex<S>>, sleeper: Z, config: PumpConfig) -> Self {
        Self {
            transport,
            stack,
            sleeper,
            config,
            slots: core::array::from_fn(|_| FrameSlot::EMPTY),
            rx_buf: [0; MTU],
            drops: 0,
        }
    }

    /// Frames dropped since the pump started.
    pub fn drops(&self) -> u64 {
        self.drops
    }

    /// Populated slots and their retry counters.
    pub fn slot_state(&self) -> [(usize, u32); N] {
        core::array::from_fn(|i| (self.slots[i].len, self.slots[i].retries))
    }

    /// Run one pump iteration.
    pub fn step(&mut self) -> Iteration {
        let mut it = Iteration::default();

        match self.transport.receive(&mut self.rx_buf) {
            Ok(Some(len)) if len > 0 => {
                it.rx_activity = true;
                if let Err(e) = self.stack.lock().receive_frame(&self.rx_buf[..len]) {
                    log::debug!(target: "pump", "stack rejected inbound frame: {}", e);
                }
            }
            Ok(_) => {}
            Err(e) => log::debug!(target: "pump", "receive: {}", e),
        }

        {
            let mut stack = self.stack.lock();
            for slot in self.slots.iter_mut() {
                // Slots awaiting retransmission keep their frame.
                if slot.retries != 0 || slot.len != 0 {
                    continue;
                }
                match stack.emit_frame(&mut slot.buf) {
                    Ok(0) => break,
                    Ok(len) => slot.len = len,
                    Err(e) => {
                        log::debug!(target: "pump", "emit: {}", e);
                        break;
                    }
                }
            }
        }

        if self.slots.iter().all(|s| s.len == 0) {
            if !it.rx_activity {
                self.sleeper.sleep(self.config.idle);
                it.idled = true;
            }
            return it;
        }

        for slot in self.slots.iter_mut().filter(|s| s.len > 0) {
            match self.transport.transmit(&slot.buf[..slot.len]) {
                Ok(()) => {
                    slot.clear();
                    it.transmitted += 1;
                }
                Err(e) => {
                    slot.retries += 1;
                    if slot.retries > self.config.max_retries {
                        log::warn!(
                            target: "pump",
                            "dropped {}-byte frame after {} attempts: {}",
                            slot.len,
                            slot.retries,
                            e
                        );
                        slot.clear();
                        it.dropped += 1;
                        self.drops += 1;
                    }
                }
            }
        }
        it
    }

    pub fn run(&mut self) -> ! {
        log::info!(target: "pump", "running with {} slots", N);
        loop {
            self.step();
        }
    }
}

/// Start `pump` on its own thread.
#[cfg(feature = "std")]
pub fn spawn_pump<T, S, Z, const N: usize>(
    pump: PacketPump<T, S, Z, N>,
) -> std::io::Result<std::thread::JoinHandle<()>>
where
    T: FrameTransport + Send + 'static,
    S: FrameStack + Send + 'static,
    Z: Sleeper + Send + 'static,
{
    std::thread::Builder::new()
        .name("packet-pump".into())
        .spawn(move || {
            let mut pump = pump;
            pump.run()
        })
}
