//! Domain event to integration event mapping.
//!
//! A closed mapping: every domain event variant of both contexts has
//! exactly one integration event type, schema version, and deterministic
//! dedupe key. Trading keys embed a monotonic fact (cumulative quantities,
//! terminal transitions) so retried publications of the same fact collapse
//! on the consumer side while distinct facts never collide. Portfolio
//! confirmations have no such fact (balances can revisit prior values), so
//! their keys carry the event id minted here; the mapped event is stored
//! with its outbox message, keeping the key stable across redeliveries.

use serde_json::to_value;

use crate::domain::portfolio::events::PortfolioEvent;
use crate::domain::shared::EventId;
use crate::domain::trading::events::TradingEvent;

use super::errors::MessagingError;
use super::integration_events::{EventSource, IntegrationEvent};

/// Schema version stamped on every mapped event.
pub const SCHEMA_VERSION: u32 = 1;

/// Maps domain events to their wire representation.
pub struct IntegrationEventMapper;

impl IntegrationEventMapper {
    /// Map a trading domain event.
    ///
    /// # Errors
    ///
    /// Returns error if the payload cannot be serialized.
    pub fn from_trading(event: &TradingEvent) -> Result<IntegrationEvent, MessagingError> {
        let order_id = event.order_id().as_str();
        let (event_type, dedupe_key, data) = match event {
            TradingEvent::Accepted(e) => (
                "trading.order.accepted",
                format!("trading.order.accepted:{order_id}"),
                to_value(e)?,
            ),
            TradingEvent::PartiallyFilled(e) => (
                "trading.order.partially_filled",
                format!(
                    "trading.order.partially_filled:{order_id}:{}",
                    e.cumulative_quantity
                ),
                to_value(e)?,
            ),
            TradingEvent::Filled(e) => (
                "trading.order.filled",
                format!("trading.order.filled:{order_id}:{}", e.total_quantity),
                to_value(e)?,
            ),
            TradingEvent::Canceled(e) => (
                "trading.order.canceled",
                format!("trading.order.canceled:{order_id}"),
                to_value(e)?,
            ),
            TradingEvent::Rejected(e) => (
                "trading.order.rejected",
                format!("trading.order.rejected:{order_id}"),
                to_value(e)?,
            ),
        };

        Ok(IntegrationEvent {
            id: EventId::generate(),
            event_type: event_type.to_string(),
            source: EventSource::Trading,
            subject: order_id.to_string(),
            occurred_at: event.occurred_at(),
            data,
            schema_version: SCHEMA_VERSION,
            dedupe_key,
        })
    }

    /// Map a portfolio domain event.
    ///
    /// # Errors
    ///
    /// Returns error if the payload cannot be serialized.
    pub fn from_portfolio(event: &PortfolioEvent) -> Result<IntegrationEvent, MessagingError> {
        let portfolio_id = event.portfolio_id().as_str();
        let (event_type, data) = match event {
            PortfolioEvent::FundsDeposited(e) => ("portfolio.funds.deposited", to_value(e)?),
            PortfolioEvent::FundsWithdrawn(e) => ("portfolio.funds.withdrawn", to_value(e)?),
            PortfolioEvent::FundsReserved(e) => ("portfolio.funds.reserved", to_value(e)?),
            PortfolioEvent::ReservationReleased(e) => {
                ("portfolio.reservation.released", to_value(e)?)
            }
            PortfolioEvent::SharesReserved(e) => ("portfolio.shares.reserved", to_value(e)?),
            PortfolioEvent::SharesReleased(e) => ("portfolio.shares.released", to_value(e)?),
            PortfolioEvent::FillApplied(e) => ("portfolio.fill.applied", to_value(e)?),
        };

        // Reserve-release-reserve cycles revisit earlier balances, so the
        // key cannot be built from resulting totals; the minted id is
        // unique per logical event and stable once the mapped event sits
        // in the outbox.
        let id = EventId::generate();
        let dedupe_key = format!("{event_type}:{portfolio_id}:{id}");

        Ok(IntegrationEvent {
            id,
            event_type: event_type.to_string(),
            source: EventSource::Portfolio,
            subject: portfolio_id.to_string(),
            occurred_at: event.occurred_at(),
            data,
            schema_version: SCHEMA_VERSION,
            dedupe_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::{Money, OrderId, Quantity, Symbol, Timestamp, UserId};
    use crate::domain::trading::events::{OrderFilled, OrderPartiallyFilled};
    use crate::domain::trading::value_objects::OrderSide;
    use rust_decimal_macros::dec;

    fn partial_fill(cumulative: i64) -> TradingEvent {
        TradingEvent::PartiallyFilled(OrderPartiallyFilled {
            order_id: OrderId::new("ord-1"),
            user_id: UserId::new("user-1"),
            symbol: Symbol::new("AAPL"),
            side: OrderSide::Buy,
            fill_quantity: Quantity::from_i64(5),
            fill_price: Money::new(dec!(100)),
            cumulative_quantity: Quantity::from_i64(cumulative),
            limit_price: Some(Money::new(dec!(100))),
            occurred_at: Timestamp::now(),
        })
    }

    #[test]
    fn trading_event_mapping() {
        let mapped = IntegrationEventMapper::from_trading(&partial_fill(5)).unwrap();

        assert_eq!(mapped.event_type, "trading.order.partially_filled");
        assert_eq!(mapped.source, EventSource::Trading);
        assert_eq!(mapped.subject, "ord-1");
        assert_eq!(mapped.schema_version, 1);
        assert_eq!(mapped.dedupe_key, "trading.order.partially_filled:ord-1:5");
        assert_eq!(mapped.data["fill_quantity"], serde_json::json!("5"));
    }

    #[test]
    fn dedupe_key_is_deterministic_but_distinct_per_fact() {
        let first = IntegrationEventMapper::from_trading(&partial_fill(5)).unwrap();
        let again = IntegrationEventMapper::from_trading(&partial_fill(5)).unwrap();
        let advanced = IntegrationEventMapper::from_trading(&partial_fill(10)).unwrap();

        // Same fact maps to the same key even across distinct event ids
        assert_eq!(first.dedupe_key, again.dedupe_key);
        assert_ne!(first.id, again.id);
        // A new cumulative quantity is a new fact
        assert_ne!(first.dedupe_key, advanced.dedupe_key);
    }

    #[test]
    fn filled_event_keyed_by_total_quantity() {
        let event = TradingEvent::Filled(OrderFilled {
            order_id: OrderId::new("ord-9"),
            user_id: UserId::new("user-1"),
            symbol: Symbol::new("AAPL"),
            side: OrderSide::Sell,
            fill_quantity: Quantity::from_i64(10),
            fill_price: Money::new(dec!(100)),
            total_quantity: Quantity::from_i64(100),
            average_price: Money::new(dec!(99.5)),
            limit_price: None,
            occurred_at: Timestamp::now(),
        });

        let mapped = IntegrationEventMapper::from_trading(&event).unwrap();
        assert_eq!(mapped.dedupe_key, "trading.order.filled:ord-9:100");
    }

    #[test]
    fn reserve_release_reserve_cycle_keys_never_collide() {
        let mut portfolio = crate::domain::portfolio::Portfolio::new(UserId::new("user-1"));
        portfolio.deposit(Money::new(dec!(1000))).unwrap();
        let order_id = OrderId::new("ord-1");

        let first = portfolio
            .reserve_funds(&order_id, Money::new(dec!(100)))
            .unwrap();
        portfolio
            .release_funds(&order_id, Money::new(dec!(100)))
            .unwrap();
        let second = portfolio
            .reserve_funds(&order_id, Money::new(dec!(100)))
            .unwrap();

        // Same order, same amount, same resulting balance, distinct facts
        let first = IntegrationEventMapper::from_portfolio(&first).unwrap();
        let second = IntegrationEventMapper::from_portfolio(&second).unwrap();
        assert_ne!(first.dedupe_key, second.dedupe_key);
    }

    #[test]
    fn portfolio_event_mapping() {
        let mut portfolio = crate::domain::portfolio::Portfolio::new(UserId::new("user-1"));
        let event = portfolio.deposit(Money::new(dec!(1000))).unwrap();

        let mapped = IntegrationEventMapper::from_portfolio(&event).unwrap();
        assert_eq!(mapped.event_type, "portfolio.funds.deposited");
        assert_eq!(mapped.source, EventSource::Portfolio);
        assert_eq!(mapped.subject, portfolio.id().as_str());
        assert!(mapped.dedupe_key.starts_with("portfolio.funds.deposited:"));
    }
}
