//! Time in force for orders.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Time in force specifying order validity duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeInForce {
    /// Good-til-canceled.
    Gtc,
    /// Valid for the current UTC day only.
    Day,
    /// Immediate-or-cancel (fill what you can now, cancel remainder).
    Ioc,
    /// Fill-or-kill (all or nothing, no partial fills).
    Fok,
}

impl TimeInForce {
    /// Returns true if the order requires immediate execution and may not
    /// rest past its first execution pass.
    #[must_use]
    pub const fn is_immediate(&self) -> bool {
        matches!(self, Self::Ioc | Self::Fok)
    }

    /// Returns true if the order must fill its full remaining quantity in
    /// a single execution or not at all.
    #[must_use]
    pub const fn is_all_or_nothing(&self) -> bool {
        matches!(self, Self::Fok)
    }

    /// Returns true if the order expires at the end of its UTC day.
    #[must_use]
    pub const fn expires_end_of_day(&self) -> bool {
        matches!(self, Self::Day)
    }
}

impl Default for TimeInForce {
    fn default() -> Self {
        Self::Gtc
    }
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gtc => write!(f, "GTC"),
            Self::Day => write!(f, "DAY"),
            Self::Ioc => write!(f, "IOC"),
            Self::Fok => write!(f, "FOK"),
        }
    }
}
