//! Portfolio domain errors.

use std::error::Error;
use std::fmt;

/// Errors raised by portfolio operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortfolioError {
    /// Not enough available cash for the requested operation.
    InsufficientFunds {
        /// Amount requested.
        requested: String,
        /// Amount available.
        available: String,
    },
    /// Not enough shares in the position for the requested operation.
    InsufficientShares {
        /// Symbol involved.
        symbol: String,
        /// Quantity requested.
        requested: String,
        /// Quantity available.
        available: String,
    },
    /// Operation parameter failed validation.
    InvalidAmount {
        /// Field that failed validation.
        field: String,
        /// Why validation failed.
        message: String,
    },
    /// Portfolio not found.
    NotFound {
        /// User whose portfolio was requested.
        user_id: String,
    },
}

impl fmt::Display for PortfolioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientFunds {
                requested,
                available,
            } => {
                write!(
                    f,
                    "Insufficient funds: requested {requested}, available {available}"
                )
            }
            Self::InsufficientShares {
                symbol,
                requested,
                available,
            } => {
                write!(
                    f,
                    "Insufficient shares of {symbol}: requested {requested}, available {available}"
                )
            }
            Self::InvalidAmount { field, message } => {
                write!(f, "Invalid amount for {field}: {message}")
            }
            Self::NotFound { user_id } => {
                write!(f, "Portfolio not found for user {user_id}")
            }
        }
    }
}

impl Error for PortfolioError {}
