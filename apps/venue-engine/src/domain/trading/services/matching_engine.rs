//! Quote-driven matching engine.
//!
//! A pure decision function: given a quote snapshot and the open orders for
//! that symbol, propose the fills the quote justifies. No aggregate is
//! mutated here and no I/O is performed; the quote-pass use case applies the
//! proposals under the symbol gate.

use crate::domain::shared::{Money, Quantity};
use crate::domain::trading::aggregate::Order;
use crate::domain::trading::value_objects::{OrderSide, OrderType, ProposedFill, QuoteSnapshot};

/// Decides how much of an eligible order a single quote tick may fill.
///
/// Separating sizing from eligibility lets simulations plug in different
/// liquidity assumptions without touching the crossing rules.
pub trait FillPolicy: Send + Sync {
    /// Quantity to fill for `order` on this tick. The engine clamps the
    /// result to the order's remaining quantity; returning zero skips the
    /// order.
    fn fill_quantity(&self, order: &Order, quote: &QuoteSnapshot) -> Quantity;
}

/// Fill policy that caps each order at a fixed per-tick quantity.
#[derive(Debug, Clone)]
pub struct MaxPerTickPolicy {
    max_per_tick: Quantity,
}

impl MaxPerTickPolicy {
    /// Create a policy capping fills at `max_per_tick` per order per tick.
    #[must_use]
    pub const fn new(max_per_tick: Quantity) -> Self {
        Self { max_per_tick }
    }
}

impl FillPolicy for MaxPerTickPolicy {
    fn fill_quantity(&self, order: &Order, _quote: &QuoteSnapshot) -> Quantity {
        order.remaining_quantity().min(self.max_per_tick)
    }
}

/// Quote-driven matching over a symbol's open orders.
pub struct MatchingEngine<P: FillPolicy> {
    fill_policy: P,
}

impl<P: FillPolicy> MatchingEngine<P> {
    /// Create an engine with the given fill policy.
    #[must_use]
    pub const fn new(fill_policy: P) -> Self {
        Self { fill_policy }
    }

    /// Propose fills for `orders` against `quote`.
    ///
    /// An order is eligible when it is open with remaining quantity and its
    /// price crosses the quote: market orders always cross, a limit buy
    /// crosses when its limit is at or above the ask, a limit sell when its
    /// limit is at or below the bid. Fill-or-kill orders are only proposed
    /// when the sized quantity covers their entire remaining amount.
    #[must_use]
    pub fn propose_fills(&self, quote: &QuoteSnapshot, orders: &[Order]) -> Vec<ProposedFill> {
        orders
            .iter()
            .filter(|order| order.symbol() == &quote.symbol && order.is_executable())
            .filter(|order| Self::crosses(order, quote))
            .filter_map(|order| {
                let quantity = self
                    .fill_policy
                    .fill_quantity(order, quote)
                    .min(order.remaining_quantity());
                if !quantity.is_positive() {
                    return None;
                }
                if order.time_in_force().is_all_or_nothing()
                    && quantity < order.remaining_quantity()
                {
                    return None;
                }
                Some(ProposedFill {
                    order_id: order.id().clone(),
                    quantity,
                    price: Self::fill_price(order, quote),
                })
            })
            .collect()
    }

    fn crosses(order: &Order, quote: &QuoteSnapshot) -> bool {
        match (order.order_type(), order.side(), order.limit_price()) {
            (OrderType::Market, _, _) => true,
            (OrderType::Limit, OrderSide::Buy, Some(limit)) => limit >= quote.ask,
            (OrderType::Limit, OrderSide::Sell, Some(limit)) => limit <= quote.bid,
            (OrderType::Limit, _, None) => false,
        }
    }

    /// Market orders take the touch; limit orders never trade through their
    /// own limit but do take price improvement.
    fn fill_price(order: &Order, quote: &QuoteSnapshot) -> Money {
        match (order.order_type(), order.side(), order.limit_price()) {
            (OrderType::Market, OrderSide::Buy, _) | (OrderType::Limit, OrderSide::Buy, None) => {
                quote.ask
            }
            (OrderType::Market, OrderSide::Sell, _) | (OrderType::Limit, OrderSide::Sell, None) => {
                quote.bid
            }
            (OrderType::Limit, OrderSide::Buy, Some(limit)) => quote.ask.min(limit),
            (OrderType::Limit, OrderSide::Sell, Some(limit)) => quote.bid.max(limit),
        }
    }
}
