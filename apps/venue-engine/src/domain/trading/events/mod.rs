//! Domain events for the Trading context.
//!
//! Events are returned from aggregate operations rather than buffered on
//! the aggregate; the caller owns dispatching them.

use serde::{Deserialize, Serialize};

use super::value_objects::{CancelReason, OrderSide, OrderType, RejectReason, TimeInForce};
use crate::domain::shared::{Money, OrderId, Quantity, Symbol, Timestamp, UserId};

/// All possible trading events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradingEvent {
    /// Order accepted by the venue.
    Accepted(OrderAccepted),
    /// Order partially filled.
    PartiallyFilled(OrderPartiallyFilled),
    /// Order completely filled.
    Filled(OrderFilled),
    /// Order canceled.
    Canceled(OrderCanceled),
    /// Order rejected.
    Rejected(OrderRejected),
}

impl TradingEvent {
    /// Get the order ID for this event.
    #[must_use]
    pub fn order_id(&self) -> &OrderId {
        match self {
            Self::Accepted(e) => &e.order_id,
            Self::PartiallyFilled(e) => &e.order_id,
            Self::Filled(e) => &e.order_id,
            Self::Canceled(e) => &e.order_id,
            Self::Rejected(e) => &e.order_id,
        }
    }

    /// Get the symbol for this event.
    #[must_use]
    pub fn symbol(&self) -> &Symbol {
        match self {
            Self::Accepted(e) => &e.symbol,
            Self::PartiallyFilled(e) => &e.symbol,
            Self::Filled(e) => &e.symbol,
            Self::Canceled(e) => &e.symbol,
            Self::Rejected(e) => &e.symbol,
        }
    }

    /// Get the timestamp when this event occurred.
    #[must_use]
    pub fn occurred_at(&self) -> Timestamp {
        match self {
            Self::Accepted(e) => e.occurred_at,
            Self::PartiallyFilled(e) => e.occurred_at,
            Self::Filled(e) => e.occurred_at,
            Self::Canceled(e) => e.occurred_at,
            Self::Rejected(e) => e.occurred_at,
        }
    }

    /// Get the event type name.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::Accepted(_) => "ORDER_ACCEPTED",
            Self::PartiallyFilled(_) => "ORDER_PARTIALLY_FILLED",
            Self::Filled(_) => "ORDER_FILLED",
            Self::Canceled(_) => "ORDER_CANCELED",
            Self::Rejected(_) => "ORDER_REJECTED",
        }
    }
}

/// Event: Order accepted by the venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAccepted {
    /// Order ID.
    pub order_id: OrderId,
    /// Owning user.
    pub user_id: UserId,
    /// Symbol.
    pub symbol: Symbol,
    /// Side.
    pub side: OrderSide,
    /// Order type.
    pub order_type: OrderType,
    /// Requested quantity.
    pub quantity: Quantity,
    /// Limit price (limit orders only).
    pub limit_price: Option<Money>,
    /// Time in force.
    pub time_in_force: TimeInForce,
    /// When the event occurred.
    pub occurred_at: Timestamp,
}

/// Event: Order partially filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPartiallyFilled {
    /// Order ID.
    pub order_id: OrderId,
    /// Owning user.
    pub user_id: UserId,
    /// Symbol.
    pub symbol: Symbol,
    /// Side.
    pub side: OrderSide,
    /// Fill quantity for this execution.
    pub fill_quantity: Quantity,
    /// Fill price for this execution.
    pub fill_price: Money,
    /// Cumulative quantity filled so far.
    pub cumulative_quantity: Quantity,
    /// Limit price (limit orders only), for reservation release.
    pub limit_price: Option<Money>,
    /// When the event occurred.
    pub occurred_at: Timestamp,
}

/// Event: Order completely filled.
///
/// Carries the final fill increment alongside the totals so settlement
/// can be driven from this event alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFilled {
    /// Order ID.
    pub order_id: OrderId,
    /// Owning user.
    pub user_id: UserId,
    /// Symbol.
    pub symbol: Symbol,
    /// Side.
    pub side: OrderSide,
    /// Quantity of the final fill.
    pub fill_quantity: Quantity,
    /// Price of the final fill.
    pub fill_price: Money,
    /// Total quantity filled.
    pub total_quantity: Quantity,
    /// Notional-weighted average fill price.
    pub average_price: Money,
    /// Limit price (limit orders only), for reservation release.
    pub limit_price: Option<Money>,
    /// When the event occurred.
    pub occurred_at: Timestamp,
}

/// Event: Order canceled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCanceled {
    /// Order ID.
    pub order_id: OrderId,
    /// Owning user.
    pub user_id: UserId,
    /// Symbol.
    pub symbol: Symbol,
    /// Side.
    pub side: OrderSide,
    /// Reason for cancellation.
    pub reason: CancelReason,
    /// Quantity filled before cancellation.
    pub filled_quantity: Quantity,
    /// Quantity left unfilled at cancellation.
    pub remaining_quantity: Quantity,
    /// Limit price (limit orders only), for reservation release.
    pub limit_price: Option<Money>,
    /// When the event occurred.
    pub occurred_at: Timestamp,
}

/// Event: Order rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRejected {
    /// Order ID.
    pub order_id: OrderId,
    /// Owning user.
    pub user_id: UserId,
    /// Symbol.
    pub symbol: Symbol,
    /// Side.
    pub side: OrderSide,
    /// Reason for rejection.
    pub reason: RejectReason,
    /// Quantity left unfilled at rejection.
    pub remaining_quantity: Quantity,
    /// Limit price (limit orders only), for reservation release.
    pub limit_price: Option<Money>,
    /// When the event occurred.
    pub occurred_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn accepted_event() -> TradingEvent {
        TradingEvent::Accepted(OrderAccepted {
            order_id: OrderId::new("ord-123"),
            user_id: UserId::new("user-1"),
            symbol: Symbol::new("AAPL"),
            side: OrderSide::Buy,
            order_type: OrderType::Limit,
            quantity: Quantity::from_i64(100),
            limit_price: Some(Money::new(dec!(150.00))),
            time_in_force: TimeInForce::Gtc,
            occurred_at: Timestamp::now(),
        })
    }

    #[test]
    fn trading_event_accessors() {
        let event = accepted_event();
        assert_eq!(event.order_id().as_str(), "ord-123");
        assert_eq!(event.symbol().as_str(), "AAPL");
        assert_eq!(event.event_type(), "ORDER_ACCEPTED");
    }

    #[test]
    fn trading_event_type_names() {
        let event = TradingEvent::Filled(OrderFilled {
            order_id: OrderId::new("ord-123"),
            user_id: UserId::new("user-1"),
            symbol: Symbol::new("AAPL"),
            side: OrderSide::Buy,
            fill_quantity: Quantity::from_i64(100),
            fill_price: Money::new(dec!(150.00)),
            total_quantity: Quantity::from_i64(100),
            average_price: Money::new(dec!(150.00)),
            limit_price: Some(Money::new(dec!(150.00))),
            occurred_at: Timestamp::now(),
        });
        assert_eq!(event.event_type(), "ORDER_FILLED");
    }

    #[test]
    fn trading_event_serde() {
        let event = accepted_event();
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("ACCEPTED"));

        let parsed: TradingEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn canceled_event_carries_remaining_quantity() {
        let event = OrderCanceled {
            order_id: OrderId::new("ord-123"),
            user_id: UserId::new("user-1"),
            symbol: Symbol::new("AAPL"),
            side: OrderSide::Sell,
            reason: CancelReason::expired(),
            filled_quantity: Quantity::from_i64(40),
            remaining_quantity: Quantity::from_i64(60),
            limit_price: None,
            occurred_at: Timestamp::now(),
        };
        assert_eq!(event.remaining_quantity, Quantity::from_i64(60));
    }
}
