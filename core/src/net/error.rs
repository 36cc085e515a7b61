//! Bring-up errors.
//!
//! Every stage fails with its own variant, and every variant maps to
//! exactly one [`StatusCode`] so the display can show which stage broke.

use core::fmt;

use tether_network::{NetworkError, RadioError};

use super::status::StatusCode;

/// Link bring-up error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BringupError {
    /// The radio is not present or not usable.
    Device,
    /// Requested static address is malformed.
    InvalidAddress,
    /// Radio initialisation failed.
    RadioInit(RadioError),
    /// Every association attempt failed.
    JoinFailed { attempts: u32, last: RadioError },
    /// The lease request could not be issued.
    LeaseRequest(NetworkError),
    /// Lease budget spent and no static address to fall back to.
    NoLease,
    ListenerCreate,
    ListenerActivate,
    /// Listen port malformed.
    InvalidPort,
}

impl BringupError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Device => StatusCode::Device,
            Self::InvalidAddress => StatusCode::Ip,
            Self::RadioInit(_) => StatusCode::Wifi,
            Self::JoinFailed { .. } => StatusCode::Wpa2,
            Self::LeaseRequest(_) => StatusCode::Dhcp1,
            Self::NoLease => StatusCode::Dhcp2,
            Self::ListenerCreate => StatusCode::Listen1,
            Self::ListenerActivate => StatusCode::Listen2,
            Self::InvalidPort => StatusCode::Port,
        }
    }

    /// Get a human-readable description of the error.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Device => "Radio device unavailable",
            Self::InvalidAddress => "Requested static address is malformed",
            Self::RadioInit(_) => "Radio initialisation failed",
            Self::JoinFailed { .. } => "Association failed on every attempt",
            Self::LeaseRequest(_) => "Lease request could not be issued",
            Self::NoLease => "No lease and no static fallback address",
            Self::ListenerCreate => "Listener creation failed",
            Self::ListenerActivate => "Listener activation failed",
            Self::InvalidPort => "Listen port is malformed",
        }
    }
}

impl fmt::Display for BringupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RadioInit(e) => write!(f, "{}: {}", self.description(), e),
            Self::JoinFailed { attempts, last } => {
                write!(f, "{} ({} attempts, last: {})", self.description(), attempts, last)
            }
            Self::LeaseRequest(e) => write!(f, "{}: {}", self.description(), e),
            _ => f.write_str(self.description()),
        }
    }
}

/// Result type for link bring-up.
pub type BringupResult<T> = Result<T, BringupError>;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    #[test]
    fn test_each_stage_has_its_status() {
        assert_eq!(BringupError::Device.status(), StatusCode::Device);
        assert_eq!(BringupError::InvalidAddress.status(), StatusCode::Ip);
        assert_eq!(BringupError::RadioInit(RadioError::Firmware).status(), StatusCode::Wifi);
        assert_eq!(
            BringupError::JoinFailed { attempts: 5, last: RadioError::AuthRejected }.status(),
            StatusCode::Wpa2
        );
        assert_eq!(
            BringupError::LeaseRequest(NetworkError::PortExhausted).status(),
            StatusCode::Dhcp1
        );
        assert_eq!(BringupError::NoLease.status(), StatusCode::Dhcp2);
        assert_eq!(BringupError::ListenerCreate.status(), StatusCode::Listen1);
        assert_eq!(BringupError::ListenerActivate.status(), StatusCode::Listen2);
        assert_eq!(BringupError::InvalidPort.status(), StatusCode::Port);
    }

    #[test]
    fn test_display_carries_cause() {
        let e = BringupError::JoinFailed { attempts: 5, last: RadioError::Timeout };
        let text = format!("{}", e);
        assert!(text.starts_with("Association failed on every attempt (5 attempts"));
    }
}
