//! Order Aggregate Root
//!
//! The Order aggregate manages the complete lifecycle of an order:
//! creation, acceptance, fills, and terminal cancellation or rejection.
//! Every state-changing operation returns the domain event it raised; the
//! aggregate keeps no hidden event buffer.

use serde::{Deserialize, Serialize};

use crate::domain::shared::{Money, OrderId, Quantity, Symbol, Timestamp, UserId};
use crate::domain::trading::errors::TradingError;
use crate::domain::trading::events::{
    OrderAccepted, OrderCanceled, OrderFilled, OrderPartiallyFilled, OrderRejected, TradingEvent,
};
use crate::domain::trading::value_objects::{
    CancelReason, OrderSide, OrderStatus, OrderType, RejectReason, TimeInForce,
};

/// Command to create a new order.
#[derive(Debug, Clone)]
pub struct PlaceOrderCommand {
    /// User placing the order.
    pub user_id: UserId,
    /// Symbol to trade.
    pub symbol: Symbol,
    /// Order side.
    pub side: OrderSide,
    /// Order type.
    pub order_type: OrderType,
    /// Quantity to trade.
    pub quantity: Quantity,
    /// Limit price (required iff Limit).
    pub limit_price: Option<Money>,
    /// Time in force.
    pub time_in_force: TimeInForce,
}

impl PlaceOrderCommand {
    /// Validate the command parameters.
    ///
    /// # Errors
    ///
    /// Returns error if required parameters are missing or invalid.
    pub fn validate(&self) -> Result<(), TradingError> {
        self.symbol
            .validate()
            .map_err(|e| TradingError::InvalidParameters {
                field: "symbol".to_string(),
                message: e.to_string(),
            })?;

        self.quantity
            .validate_for_order()
            .map_err(|e| TradingError::InvalidParameters {
                field: "quantity".to_string(),
                message: e.to_string(),
            })?;

        match (self.order_type, &self.limit_price) {
            (OrderType::Limit, None) => {
                return Err(TradingError::InvalidParameters {
                    field: "limit_price".to_string(),
                    message: "Limit price required for limit orders".to_string(),
                });
            }
            (OrderType::Market, Some(_)) => {
                return Err(TradingError::InvalidParameters {
                    field: "limit_price".to_string(),
                    message: "Market orders must not carry a limit price".to_string(),
                });
            }
            (OrderType::Limit, Some(price)) => {
                price
                    .validate_for_order()
                    .map_err(|e| TradingError::InvalidParameters {
                        field: "limit_price".to_string(),
                        message: e.to_string(),
                    })?;
            }
            (OrderType::Market, None) => {}
        }

        Ok(())
    }
}

/// Parameters for reconstituting an Order from storage.
///
/// Used by repositories to rebuild aggregates from persisted state.
/// No domain events are generated during reconstitution.
#[derive(Debug, Clone)]
pub struct ReconstitutedOrderParams {
    /// Order identifier.
    pub id: OrderId,
    /// Owning user.
    pub user_id: UserId,
    /// Symbol being traded.
    pub symbol: Symbol,
    /// Order side.
    pub side: OrderSide,
    /// Order type.
    pub order_type: OrderType,
    /// Total requested quantity.
    pub quantity: Quantity,
    /// Limit price (limit orders only).
    pub limit_price: Option<Money>,
    /// Time in force policy.
    pub time_in_force: TimeInForce,
    /// Current order status.
    pub status: OrderStatus,
    /// Cumulative filled quantity.
    pub filled_quantity: Quantity,
    /// Running notional-weighted average fill price.
    pub average_fill_price: Money,
    /// Creation timestamp.
    pub created_at: Timestamp,
    /// Expiry timestamp (Day orders only).
    pub expires_at: Option<Timestamp>,
}

/// Order Aggregate Root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    symbol: Symbol,
    side: OrderSide,
    order_type: OrderType,
    quantity: Quantity,
    limit_price: Option<Money>,
    time_in_force: TimeInForce,
    status: OrderStatus,
    filled_quantity: Quantity,
    average_fill_price: Money,
    created_at: Timestamp,
    expires_at: Option<Timestamp>,
}

impl Order {
    /// Create a new order from a command.
    ///
    /// The order starts in `New` status; `accept` raises the first event.
    ///
    /// # Errors
    ///
    /// Returns error if command validation fails.
    pub fn new(cmd: PlaceOrderCommand) -> Result<Self, TradingError> {
        cmd.validate()?;

        let now = Timestamp::now();
        let expires_at = cmd
            .time_in_force
            .expires_end_of_day()
            .then(|| now.end_of_utc_day());

        Ok(Self {
            id: OrderId::generate(),
            user_id: cmd.user_id,
            symbol: cmd.symbol,
            side: cmd.side,
            order_type: cmd.order_type,
            quantity: cmd.quantity,
            limit_price: cmd.limit_price,
            time_in_force: cmd.time_in_force,
            status: OrderStatus::New,
            filled_quantity: Quantity::ZERO,
            average_fill_price: Money::ZERO,
            created_at: now,
            expires_at,
        })
    }

    /// Create a market order.
    ///
    /// # Errors
    ///
    /// Returns error if validation fails.
    pub fn market(
        user_id: UserId,
        symbol: Symbol,
        side: OrderSide,
        quantity: Quantity,
        time_in_force: TimeInForce,
    ) -> Result<Self, TradingError> {
        Self::new(PlaceOrderCommand {
            user_id,
            symbol,
            side,
            order_type: OrderType::Market,
            quantity,
            limit_price: None,
            time_in_force,
        })
    }

    /// Create a limit order.
    ///
    /// # Errors
    ///
    /// Returns error if validation fails.
    pub fn limit(
        user_id: UserId,
        symbol: Symbol,
        side: OrderSide,
        quantity: Quantity,
        limit_price: Money,
        time_in_force: TimeInForce,
    ) -> Result<Self, TradingError> {
        Self::new(PlaceOrderCommand {
            user_id,
            symbol,
            side,
            order_type: OrderType::Limit,
            quantity,
            limit_price: Some(limit_price),
            time_in_force,
        })
    }

    /// Reconstitute an order from stored state (no events generated).
    #[must_use]
    pub fn reconstitute(params: ReconstitutedOrderParams) -> Self {
        Self {
            id: params.id,
            user_id: params.user_id,
            symbol: params.symbol,
            side: params.side,
            order_type: params.order_type,
            quantity: params.quantity,
            limit_price: params.limit_price,
            time_in_force: params.time_in_force,
            status: params.status,
            filled_quantity: params.filled_quantity,
            average_fill_price: params.average_fill_price,
            created_at: params.created_at,
            expires_at: params.expires_at,
        }
    }

    // ========================================================================
    // Getters
    // ========================================================================

    /// Get the order ID.
    #[must_use]
    pub const fn id(&self) -> &OrderId {
        &self.id
    }

    /// Get the owning user.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Get the symbol.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Get the order side.
    #[must_use]
    pub const fn side(&self) -> OrderSide {
        self.side
    }

    /// Get the order type.
    #[must_use]
    pub const fn order_type(&self) -> OrderType {
        self.order_type
    }

    /// Get the requested quantity.
    #[must_use]
    pub const fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Get the limit price.
    #[must_use]
    pub const fn limit_price(&self) -> Option<Money> {
        self.limit_price
    }

    /// Get the time in force.
    #[must_use]
    pub const fn time_in_force(&self) -> TimeInForce {
        self.time_in_force
    }

    /// Get the current status.
    #[must_use]
    pub const fn status(&self) -> OrderStatus {
        self.status
    }

    /// Get the cumulative filled quantity.
    #[must_use]
    pub const fn filled_quantity(&self) -> Quantity {
        self.filled_quantity
    }

    /// Get the running notional-weighted average fill price.
    #[must_use]
    pub const fn average_fill_price(&self) -> Money {
        self.average_fill_price
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Get the expiry timestamp (Day orders only).
    #[must_use]
    pub const fn expires_at(&self) -> Option<Timestamp> {
        self.expires_at
    }

    /// Quantity still open for execution.
    #[must_use]
    pub fn remaining_quantity(&self) -> Quantity {
        self.quantity - self.filled_quantity
    }

    /// True when the order can participate in an execution pass.
    #[must_use]
    pub fn is_executable(&self) -> bool {
        self.status.can_fill() && self.remaining_quantity().is_positive()
    }

    /// True when a Day order has reached the end of its UTC day while
    /// still open. IOC and FOK orders are canceled by the execution path
    /// itself, never by time.
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.status.can_fill() && self.expires_at.is_some_and(|expiry| now >= expiry)
    }

    // ========================================================================
    // State Transitions
    // ========================================================================

    /// Accept the order into the venue.
    ///
    /// # Errors
    ///
    /// Returns error unless the order is in `New` status.
    pub fn accept(&mut self) -> Result<TradingEvent, TradingError> {
        if self.status != OrderStatus::New {
            return Err(TradingError::InvalidStateTransition {
                from: self.status,
                to: OrderStatus::Accepted,
            });
        }

        self.status = OrderStatus::Accepted;

        Ok(TradingEvent::Accepted(OrderAccepted {
            order_id: self.id.clone(),
            user_id: self.user_id.clone(),
            symbol: self.symbol.clone(),
            side: self.side,
            order_type: self.order_type,
            quantity: self.quantity,
            limit_price: self.limit_price,
            time_in_force: self.time_in_force,
            occurred_at: Timestamp::now(),
        }))
    }

    /// Apply a fill to the order.
    ///
    /// Recomputes the average fill price as the notional-weighted mean of
    /// all fills so far, rounded to 4 decimals half-away-from-zero.
    ///
    /// # Errors
    ///
    /// Returns error if the order cannot receive fills, or the quantity is
    /// non-positive or exceeds the remaining quantity.
    pub fn apply_fill(
        &mut self,
        fill_qty: Quantity,
        fill_price: Money,
    ) -> Result<TradingEvent, TradingError> {
        if !self.status.can_fill() {
            return Err(TradingError::CannotFill {
                status: self.status,
            });
        }

        let remaining = self.remaining_quantity();
        if !fill_qty.is_positive() || fill_qty > remaining {
            return Err(TradingError::InvalidFillQuantity {
                fill_qty: fill_qty.to_string(),
                remaining_qty: remaining.to_string(),
            });
        }

        let old_notional = self.average_fill_price * self.filled_quantity.amount();
        let fill_notional = fill_price * fill_qty.amount();
        let new_filled = self.filled_quantity + fill_qty;

        self.average_fill_price =
            ((old_notional + fill_notional) / new_filled.amount()).round_price();
        self.filled_quantity = new_filled;

        let occurred_at = Timestamp::now();

        if self.remaining_quantity().is_zero() {
            self.status = OrderStatus::Filled;
            Ok(TradingEvent::Filled(OrderFilled {
                order_id: self.id.clone(),
                user_id: self.user_id.clone(),
                symbol: self.symbol.clone(),
                side: self.side,
                fill_quantity: fill_qty,
                fill_price,
                total_quantity: self.quantity,
                average_price: self.average_fill_price,
                limit_price: self.limit_price,
                occurred_at,
            }))
        } else {
            self.status = OrderStatus::PartiallyFilled;
            Ok(TradingEvent::PartiallyFilled(OrderPartiallyFilled {
                order_id: self.id.clone(),
                user_id: self.user_id.clone(),
                symbol: self.symbol.clone(),
                side: self.side,
                fill_quantity: fill_qty,
                fill_price,
                cumulative_quantity: self.filled_quantity,
                limit_price: self.limit_price,
                occurred_at,
            }))
        }
    }

    /// Cancel the order.
    ///
    /// # Errors
    ///
    /// Returns error if the order is already in a terminal state.
    pub fn cancel(&mut self, reason: CancelReason) -> Result<TradingEvent, TradingError> {
        if self.status.is_terminal() {
            return Err(TradingError::CannotCancel {
                status: self.status,
            });
        }

        self.status = OrderStatus::Canceled;

        Ok(TradingEvent::Canceled(OrderCanceled {
            order_id: self.id.clone(),
            user_id: self.user_id.clone(),
            symbol: self.symbol.clone(),
            side: self.side,
            reason,
            filled_quantity: self.filled_quantity,
            remaining_quantity: self.remaining_quantity(),
            limit_price: self.limit_price,
            occurred_at: Timestamp::now(),
        }))
    }

    /// Reject the order.
    ///
    /// # Errors
    ///
    /// Returns error if the order is already in a terminal state.
    pub fn reject(&mut self, reason: RejectReason) -> Result<TradingEvent, TradingError> {
        if self.status.is_terminal() {
            return Err(TradingError::InvalidStateTransition {
                from: self.status,
                to: OrderStatus::Rejected,
            });
        }

        self.status = OrderStatus::Rejected;

        Ok(TradingEvent::Rejected(OrderRejected {
            order_id: self.id.clone(),
            user_id: self.user_id.clone(),
            symbol: self.symbol.clone(),
            side: self.side,
            reason,
            remaining_quantity: self.remaining_quantity(),
            limit_price: self.limit_price,
            occurred_at: Timestamp::now(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn limit_buy(qty: i64, price: &str) -> Order {
        Order::new(PlaceOrderCommand {
            user_id: UserId::new("user-1"),
            symbol: Symbol::new("AAPL"),
            side: OrderSide::Buy,
            order_type: OrderType::Limit,
            quantity: Quantity::from_i64(qty),
            limit_price: Some(Money::new(price.parse().unwrap())),
            time_in_force: TimeInForce::Gtc,
        })
        .unwrap()
    }

    fn accepted_limit_buy(qty: i64, price: &str) -> Order {
        let mut order = limit_buy(qty, price);
        order.accept().unwrap();
        order
    }

    #[test]
    fn new_order_starts_new_with_no_fills() {
        let order = limit_buy(100, "150.00");
        assert_eq!(order.status(), OrderStatus::New);
        assert_eq!(order.filled_quantity(), Quantity::ZERO);
        assert_eq!(order.remaining_quantity(), Quantity::from_i64(100));
        assert!(order.expires_at().is_none());
    }

    #[test]
    fn limit_order_requires_price() {
        let result = Order::new(PlaceOrderCommand {
            user_id: UserId::new("user-1"),
            symbol: Symbol::new("AAPL"),
            side: OrderSide::Buy,
            order_type: OrderType::Limit,
            quantity: Quantity::from_i64(100),
            limit_price: None,
            time_in_force: TimeInForce::Gtc,
        });
        assert!(result.is_err());
    }

    #[test]
    fn market_order_rejects_price() {
        let result = Order::new(PlaceOrderCommand {
            user_id: UserId::new("user-1"),
            symbol: Symbol::new("AAPL"),
            side: OrderSide::Buy,
            order_type: OrderType::Market,
            quantity: Quantity::from_i64(100),
            limit_price: Some(Money::new(dec!(150))),
            time_in_force: TimeInForce::Gtc,
        });
        assert!(result.is_err());
    }

    #[test]
    fn invalid_symbol_rejected_at_creation() {
        let result = Order::new(PlaceOrderCommand {
            user_id: UserId::new("user-1"),
            symbol: Symbol::new("BAD SYMBOL"),
            side: OrderSide::Buy,
            order_type: OrderType::Market,
            quantity: Quantity::from_i64(100),
            limit_price: None,
            time_in_force: TimeInForce::Gtc,
        });
        assert!(matches!(
            result,
            Err(TradingError::InvalidParameters { ref field, .. }) if field == "symbol"
        ));
    }

    #[test]
    fn non_positive_quantity_rejected_at_creation() {
        let result = Order::new(PlaceOrderCommand {
            user_id: UserId::new("user-1"),
            symbol: Symbol::new("AAPL"),
            side: OrderSide::Buy,
            order_type: OrderType::Market,
            quantity: Quantity::ZERO,
            limit_price: None,
            time_in_force: TimeInForce::Gtc,
        });
        assert!(result.is_err());
    }

    #[test]
    fn day_order_expires_end_of_utc_day() {
        let order = Order::new(PlaceOrderCommand {
            user_id: UserId::new("user-1"),
            symbol: Symbol::new("AAPL"),
            side: OrderSide::Buy,
            order_type: OrderType::Market,
            quantity: Quantity::from_i64(10),
            limit_price: None,
            time_in_force: TimeInForce::Day,
        })
        .unwrap();

        let expiry = order.expires_at().unwrap();
        assert_eq!(expiry, order.created_at().end_of_utc_day());
    }

    #[test]
    fn accept_raises_accepted_event() {
        let mut order = limit_buy(100, "150.00");
        let event = order.accept().unwrap();

        assert_eq!(order.status(), OrderStatus::Accepted);
        assert!(matches!(event, TradingEvent::Accepted(_)));
    }

    #[test]
    fn accept_fails_when_not_new() {
        let mut order = accepted_limit_buy(100, "150.00");
        assert!(order.accept().is_err());
    }

    #[test]
    fn apply_fill_partial_raises_partially_filled() {
        let mut order = accepted_limit_buy(100, "150.00");

        let event = order
            .apply_fill(Quantity::from_i64(40), Money::new(dec!(149.50)))
            .unwrap();

        assert_eq!(order.status(), OrderStatus::PartiallyFilled);
        assert_eq!(order.filled_quantity(), Quantity::from_i64(40));
        assert_eq!(order.remaining_quantity(), Quantity::from_i64(60));

        match event {
            TradingEvent::PartiallyFilled(e) => {
                assert_eq!(e.fill_quantity, Quantity::from_i64(40));
                assert_eq!(e.cumulative_quantity, Quantity::from_i64(40));
            }
            other => panic!("expected PartiallyFilled, got {other:?}"),
        }
    }

    #[test]
    fn apply_fill_complete_raises_filled() {
        let mut order = accepted_limit_buy(100, "150.00");

        let event = order
            .apply_fill(Quantity::from_i64(100), Money::new(dec!(150.00)))
            .unwrap();

        assert_eq!(order.status(), OrderStatus::Filled);
        match event {
            TradingEvent::Filled(e) => {
                assert_eq!(e.fill_quantity, Quantity::from_i64(100));
                assert_eq!(e.total_quantity, Quantity::from_i64(100));
                assert_eq!(e.average_price, Money::new(dec!(150.00)));
            }
            other => panic!("expected Filled, got {other:?}"),
        }
    }

    #[test]
    fn average_fill_price_is_notional_weighted() {
        let mut order = accepted_limit_buy(100, "151.00");

        order
            .apply_fill(Quantity::from_i64(30), Money::new(dec!(149.00)))
            .unwrap();
        order
            .apply_fill(Quantity::from_i64(50), Money::new(dec!(150.00)))
            .unwrap();

        // (30*149 + 50*150) / 80 = 149.625
        assert_eq!(order.average_fill_price(), Money::new(dec!(149.625)));

        order
            .apply_fill(Quantity::from_i64(20), Money::new(dec!(151.00)))
            .unwrap();

        // (80*149.625 + 20*151) / 100 = 149.9
        assert_eq!(order.average_fill_price(), Money::new(dec!(149.9)));
        assert_eq!(order.status(), OrderStatus::Filled);
    }

    #[test]
    fn average_fill_price_rounds_to_four_decimals() {
        let mut order = accepted_limit_buy(3, "100.00");

        order
            .apply_fill(Quantity::from_i64(1), Money::new(dec!(100.00)))
            .unwrap();
        order
            .apply_fill(Quantity::from_i64(2), Money::new(dec!(100.10)))
            .unwrap();

        // (100 + 2*100.10) / 3 = 100.0666... -> 100.0667
        assert_eq!(order.average_fill_price(), Money::new(dec!(100.0667)));
    }

    #[test]
    fn apply_fill_fails_for_new_order() {
        let mut order = limit_buy(100, "150.00");
        let result = order.apply_fill(Quantity::from_i64(50), Money::new(dec!(150)));
        assert!(result.is_err());
    }

    #[test]
    fn apply_fill_rejects_zero_quantity() {
        let mut order = accepted_limit_buy(100, "150.00");
        let result = order.apply_fill(Quantity::ZERO, Money::new(dec!(150)));
        assert!(matches!(
            result,
            Err(TradingError::InvalidFillQuantity { .. })
        ));
    }

    #[test]
    fn apply_fill_rejects_overfill() {
        let mut order = accepted_limit_buy(100, "150.00");
        order
            .apply_fill(Quantity::from_i64(60), Money::new(dec!(150)))
            .unwrap();

        let result = order.apply_fill(Quantity::from_i64(50), Money::new(dec!(150)));
        assert!(result.is_err());
        assert_eq!(order.filled_quantity(), Quantity::from_i64(60));
    }

    #[test]
    fn cancel_from_new_and_accepted() {
        let mut order = limit_buy(100, "150.00");
        let event = order.cancel(CancelReason::user_requested()).unwrap();
        assert_eq!(order.status(), OrderStatus::Canceled);
        assert!(matches!(event, TradingEvent::Canceled(_)));

        let mut order = accepted_limit_buy(100, "150.00");
        assert!(order.cancel(CancelReason::user_requested()).is_ok());
    }

    #[test]
    fn cancel_carries_fill_accounting() {
        let mut order = accepted_limit_buy(100, "150.00");
        order
            .apply_fill(Quantity::from_i64(40), Money::new(dec!(150)))
            .unwrap();

        let event = order.cancel(CancelReason::expired()).unwrap();
        match event {
            TradingEvent::Canceled(e) => {
                assert_eq!(e.filled_quantity, Quantity::from_i64(40));
                assert_eq!(e.remaining_quantity, Quantity::from_i64(60));
            }
            other => panic!("expected Canceled, got {other:?}"),
        }
    }

    #[test]
    fn terminal_states_are_immutable() {
        let mut order = accepted_limit_buy(100, "150.00");
        order
            .apply_fill(Quantity::from_i64(100), Money::new(dec!(150)))
            .unwrap();

        assert!(order.cancel(CancelReason::user_requested()).is_err());
        assert!(order.reject(RejectReason::insufficient_funds()).is_err());
        assert!(
            order
                .apply_fill(Quantity::from_i64(1), Money::new(dec!(150)))
                .is_err()
        );
    }

    #[test]
    fn reject_from_any_open_state() {
        let mut order = limit_buy(100, "150.00");
        assert!(order.reject(RejectReason::insufficient_funds()).is_ok());
        assert_eq!(order.status(), OrderStatus::Rejected);

        let mut order = accepted_limit_buy(100, "150.00");
        order
            .apply_fill(Quantity::from_i64(10), Money::new(dec!(150)))
            .unwrap();
        assert!(order.reject(RejectReason::insufficient_funds()).is_ok());
    }

    #[test]
    fn is_expired_only_for_open_day_orders() {
        let mut order = Order::new(PlaceOrderCommand {
            user_id: UserId::new("user-1"),
            symbol: Symbol::new("AAPL"),
            side: OrderSide::Buy,
            order_type: OrderType::Market,
            quantity: Quantity::from_i64(10),
            limit_price: None,
            time_in_force: TimeInForce::Day,
        })
        .unwrap();

        let past_expiry = Timestamp::new(
            order.expires_at().unwrap().as_datetime() + chrono::Duration::seconds(1),
        );

        // New orders are not expired; only Accepted/PartiallyFilled are
        assert!(!order.is_expired(past_expiry));

        order.accept().unwrap();
        assert!(!order.is_expired(order.created_at()));
        assert!(order.is_expired(past_expiry));

        order.cancel(CancelReason::expired()).unwrap();
        assert!(!order.is_expired(past_expiry));
    }

    #[test]
    fn gtc_orders_never_expire() {
        let mut order = limit_buy(100, "150.00");
        order.accept().unwrap();
        let far_future = Timestamp::parse("2099-01-01T00:00:00Z").unwrap();
        assert!(!order.is_expired(far_future));
    }

    #[test]
    fn reconstitute_rebuilds_without_events() {
        let order = Order::reconstitute(ReconstitutedOrderParams {
            id: OrderId::new("ord-recon"),
            user_id: UserId::new("user-1"),
            symbol: Symbol::new("AAPL"),
            side: OrderSide::Sell,
            order_type: OrderType::Limit,
            quantity: Quantity::from_i64(100),
            limit_price: Some(Money::new(dec!(150))),
            time_in_force: TimeInForce::Gtc,
            status: OrderStatus::PartiallyFilled,
            filled_quantity: Quantity::from_i64(40),
            average_fill_price: Money::new(dec!(150.5)),
            created_at: Timestamp::now(),
            expires_at: None,
        });

        assert_eq!(order.id().as_str(), "ord-recon");
        assert_eq!(order.status(), OrderStatus::PartiallyFilled);
        assert_eq!(order.remaining_quantity(), Quantity::from_i64(60));
    }

    #[test]
    fn order_serde_roundtrip() {
        let order = limit_buy(100, "150.00");
        let json = serde_json::to_string(&order).unwrap();
        let parsed: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id(), order.id());
        assert_eq!(parsed.status(), order.status());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Filled quantity grows monotonically and never exceeds the
            // requested quantity; the average price stays within the range
            // of fill prices seen so far.
            #[test]
            fn fill_accounting_invariants(
                fills in prop::collection::vec((1i64..=20, 50i64..=250), 1..12)
            ) {
                let mut order = accepted_limit_buy(100, "999.00");
                let mut prev_filled = Quantity::ZERO;
                let mut prices: Vec<Money> = Vec::new();

                for (qty, price_int) in fills {
                    let qty = Quantity::from_i64(qty);
                    let price = Money::new(rust_decimal::Decimal::new(price_int, 0));

                    if qty > order.remaining_quantity() {
                        prop_assert!(order.apply_fill(qty, price).is_err());
                        continue;
                    }
                    order.apply_fill(qty, price).unwrap();
                    prices.push(price);

                    prop_assert!(order.filled_quantity() >= prev_filled);
                    prop_assert!(order.filled_quantity() <= order.quantity());
                    prev_filled = order.filled_quantity();

                    let min = prices.iter().min().unwrap();
                    let max = prices.iter().max().unwrap();
                    prop_assert!(order.average_fill_price() >= *min);
                    prop_assert!(order.average_fill_price() <= *max);
                }
            }
        }
    }
}
