//! Reasons for order rejection and cancellation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reason for order rejection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RejectReason {
    /// Rejection code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl RejectReason {
    /// Create a new reject reason.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Insufficient available cash for the order.
    #[must_use]
    pub fn insufficient_funds() -> Self {
        Self::new("INSUFFICIENT_FUNDS", "Insufficient available cash for order")
    }

    /// Insufficient available shares for the order.
    #[must_use]
    pub fn insufficient_shares() -> Self {
        Self::new(
            "INSUFFICIENT_SHARES",
            "Insufficient available shares for order",
        )
    }

    /// Validation failure at command time.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("VALIDATION", message)
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Reason for order cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CancelReason {
    /// Cancellation code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl CancelReason {
    /// Create a new cancel reason.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// User requested cancellation.
    #[must_use]
    pub fn user_requested() -> Self {
        Self::new("USER_REQUESTED", "Canceled by user request")
    }

    /// Day order reached the end of its UTC day.
    #[must_use]
    pub fn expired() -> Self {
        Self::new("EXPIRED", "Day order expired at end of UTC day")
    }

    /// IOC order could not fill (fully or partially) on its first pass.
    #[must_use]
    pub fn ioc_unfilled() -> Self {
        Self::new("IOC_UNFILLED", "IOC remainder canceled after execution pass")
    }

    /// FOK order could not fill in full on its first pass.
    #[must_use]
    pub fn fok_unfilled() -> Self {
        Self::new("FOK_UNFILLED", "FOK order could not fill in full")
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}
