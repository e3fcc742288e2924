//! Application Use Cases
//!
//! Orchestration over the domain: each use case loads aggregates through
//! ports, invokes domain operations, and commits the mutated aggregates
//! together with the integration events they raised.

mod cancel_order;
mod maintenance_sweep;
mod manage_funds;
mod place_order;
mod quote_pass;
mod trade_print_pass;

pub use cancel_order::CancelOrderUseCase;
pub use maintenance_sweep::MaintenanceSweepUseCase;
pub use manage_funds::ManageFundsUseCase;
pub use place_order::PlaceOrderUseCase;
pub use quote_pass::QuotePassUseCase;
pub use trade_print_pass::TradePrintPassUseCase;

use thiserror::Error;

use crate::application::ports::FeedError;
use crate::domain::portfolio::PortfolioError;
use crate::domain::trading::TradingError;
use crate::messaging::MessagingError;

/// Errors surfaced by use cases.
#[derive(Debug, Error)]
pub enum UseCaseError {
    /// Trading domain rule or state violation.
    #[error(transparent)]
    Trading(#[from] TradingError),

    /// Portfolio domain rule violation.
    #[error(transparent)]
    Portfolio(#[from] PortfolioError),

    /// Persistence, outbox, or bus failure.
    #[error(transparent)]
    Messaging(#[from] MessagingError),

    /// Market data feed failure.
    #[error(transparent)]
    Feed(#[from] FeedError),
}
