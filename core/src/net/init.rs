//! Link bring-up orchestrator.
//!
//! Takes the radio from power-up to a bound protocol stack:
//!
//! ```text
//! Init ──▶ Associating{1..=n} ──▶ ObtainingLease ──▶ Bound
//!   │             │                     │
//!   └─────────────┴─────────────────────┴──▶ Failed(reason)
//! ```
//!
//! Every stage has a hard budget from [`BringupPolicy`], so a bad radio
//! environment ends in a specific [`BringupError`] instead of a hang.
//! The packet pump is started through a caller-supplied launcher as soon
//! as the stack exists, because lease traffic only flows while the pump
//! runs. Bring-up never runs the pump loop itself.

use alloc::sync::Arc;

use spin::Mutex;

use tether_network::stack::{LeaseClient, StackSettings, STATIC_PREFIX_LEN};
use tether_network::{Lease, Radio, RadioError, Sleeper};

use super::config::{BringupPolicy, LinkConfig};
use super::error::{BringupError, BringupResult};
use super::status::{NetworkStatus, StatusCode};

/// Bring-up progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkState {
    Init,
    /// Association attempt in progress (1-based).
    Associating { attempt: u32 },
    ObtainingLease,
    Bound,
    Failed(BringupError),
}

/// A stack with an address.
pub struct BoundLink<S> {
    pub stack: Arc<Mutex<S>>,
    pub status: NetworkStatus,
    /// `None` when the static fallback address is in use.
    pub lease: Option<Lease>,
}

impl<S> BoundLink<S> {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::Ok
    }
}

/// Drives one radio through association and address acquisition.
pub struct LinkBringup<'a, R, Z> {
    radio: &'a mut R,
    sleeper: Z,
    config: LinkConfig,
    policy: BringupPolicy,
    state: LinkState,
}

impl<'a, R: Radio, Z: Sleeper> LinkBringup<'a, R, Z> {
    pub fn new(radio: &'a mut R, sleeper: Z, config: LinkConfig) -> Self {
        Self {
            radio,
            sleeper,
            config,
            policy: BringupPolicy::default(),
            state: LinkState::Init,
        }
    }

    pub fn with_policy(mut self, policy: BringupPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn state(&self) -> &LinkState {
        &self.state
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Bring the link up.
    ///
    /// `make_stack` builds the protocol stack once the radio is associated;
    /// `launch_pump` is called exactly once with the shared stack, before
    /// the first lease poll.
    pub fn run<S, F, L>(&mut self, make_stack: F, launch_pump: L) -> BringupResult<BoundLink<S>>
    where
        S: LeaseClient,
        F: FnOnce(StackSettings) -> S,
        L: FnOnce(Arc<Mutex<S>>),
    {
        let result = self.bring_up(make_stack, launch_pump);
        match &result {
            Ok(link) => {
                log::info!(target: "wifi", "link up: {}", link.status);
                self.state = LinkState::Bound;
            }
            Err(e) => {
                log::error!(target: "wifi", "bring-up failed [{}]: {}", e.status(), e);
                self.state = LinkState::Failed(e.clone());
            }
        }
        result
    }

    fn bring_up<S, F, L>(&mut self, make_stack: F, launch_pump: L) -> BringupResult<BoundLink<S>>
    where
        S: LeaseClient,
        F: FnOnce(StackSettings) -> S,
        L: FnOnce(Arc<Mutex<S>>),
    {
        // Fail fast, before the radio is touched.
        let requested = self.config.validate_requested_address()?;

        if !self.policy.radio_settle.is_zero() {
            self.sleeper.sleep(self.policy.radio_settle);
        }

        log::info!(target: "wifi", "initializing radio");
        self.radio.init().map_err(|e| match e {
            RadioError::NotPresent => BringupError::Device,
            other => BringupError::RadioInit(other),
        })?;

        self.associate()?;

        let mac = self.radio.mac_address();
        let stack = Arc::new(Mutex::new(make_stack(self.config.stack_settings(mac))));
        launch_pump(stack.clone());

        self.state = LinkState::ObtainingLease;
        stack
            .lock()
            .begin_lease(&self.config.lease_request(requested))
            .map_err(BringupError::LeaseRequest)?;

        let policy = self.policy.lease_policy();
        let bound = policy.wait(&mut self.sleeper, || {
            let bound = stack.lock().lease().is_some();
            if !bound {
                log::debug!(target: "dhcp", "lease pending");
            }
            bound
        });

        let lease = if bound { stack.lock().lease() } else { None };
        if let Some(lease) = lease {
            let status = NetworkStatus::from_lease(&lease, mac);
            return Ok(BoundLink { stack, status, lease: Some(lease) });
        }

        let Some(addr) = requested else {
            log::error!(target: "dhcp", "no lease after {:?} and no static address", policy.budget());
            return Err(BringupError::NoLease);
        };
        log::warn!(target: "dhcp", "no lease after {:?}, using static {}", policy.budget(), addr);
        stack.lock().set_address(addr).map_err(BringupError::LeaseRequest)?;

        Ok(BoundLink {
            stack,
            status: NetworkStatus::fallback(addr, STATIC_PREFIX_LEN, mac),
            lease: None,
        })
    }

    fn associate(&mut self) -> BringupResult<()> {
        let attempts = self.policy.join_attempts.max(1);
        if self.config.passphrase.is_empty() {
            log::info!(target: "wifi", "joining open network {:?}", self.config.ssid);
        } else {
            log::info!(
                target: "wifi",
                "joining secured network {:?} (passphrase {} chars)",
                self.config.ssid,
                self.config.passphrase.len()
            );
        }

        let mut last = RadioError::Timeout;
        for attempt in 1..=attempts {
            self.state = LinkState::Associating { attempt };
            match self.radio.join(&self.config.ssid, &self.config.passphrase) {
                Ok(()) => {
                    log::info!(target: "wifi", "joined after {} attempt(s), mac {}", attempt, self.radio.mac_address());
                    return Ok(());
                }
                Err(e) => {
                    log::error!(target: "wifi", "join attempt {}/{} failed: {}", attempt, attempts, e);
                    last = e;
                    if attempt < attempts {
                        self.sleeper.sleep(self.policy.join_backoff);
                    }
                }
            }
        }
        Err(BringupError::JoinFailed { attempts, last })
    }
}
