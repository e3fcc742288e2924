//! Market data inputs to the execution pipeline.

use serde::{Deserialize, Serialize};

use crate::domain::shared::{Money, OrderId, Quantity, Symbol, Timestamp};

/// A snapshot of a symbol's current quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    /// Symbol the quote is for.
    pub symbol: Symbol,
    /// Best bid price.
    pub bid: Money,
    /// Best ask price.
    pub ask: Money,
    /// Last traded price.
    pub last: Money,
    /// When the quote was observed.
    pub timestamp: Timestamp,
}

/// A trade observed on the market tape.
///
/// Prints are not necessarily trades involving this venue's own orders;
/// they are external liquidity the venue's open orders may participate in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradePrint {
    /// Symbol the trade occurred in.
    pub symbol: Symbol,
    /// Trade price.
    pub price: Money,
    /// Trade size.
    pub quantity: Quantity,
    /// When the trade occurred.
    pub timestamp: Timestamp,
}

/// A fill proposed by the matching engine, not yet applied to any order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedFill {
    /// Order the fill is for.
    pub order_id: OrderId,
    /// Fill quantity.
    pub quantity: Quantity,
    /// Fill price.
    pub price: Money,
}
