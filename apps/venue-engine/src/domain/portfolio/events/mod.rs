//! Domain events for the Portfolio context.
//!
//! Every portfolio mutation returns exactly one of these from the
//! aggregate operation that caused it.

use serde::{Deserialize, Serialize};

use crate::domain::shared::{Money, OrderId, PortfolioId, Quantity, Symbol, Timestamp, UserId};
use crate::domain::trading::value_objects::OrderSide;

/// All possible portfolio events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PortfolioEvent {
    /// Cash deposited.
    FundsDeposited(FundsDeposited),
    /// Cash withdrawn.
    FundsWithdrawn(FundsWithdrawn),
    /// Cash reserved against a pending buy.
    FundsReserved(FundsReserved),
    /// A cash reservation released.
    ReservationReleased(ReservationReleased),
    /// Shares reserved against a pending sell.
    SharesReserved(SharesReserved),
    /// A share reservation released.
    SharesReleased(SharesReleased),
    /// A fill settled against the portfolio.
    FillApplied(FillApplied),
}

impl PortfolioEvent {
    /// Get the portfolio ID for this event.
    #[must_use]
    pub fn portfolio_id(&self) -> &PortfolioId {
        match self {
            Self::FundsDeposited(e) => &e.portfolio_id,
            Self::FundsWithdrawn(e) => &e.portfolio_id,
            Self::FundsReserved(e) => &e.portfolio_id,
            Self::ReservationReleased(e) => &e.portfolio_id,
            Self::SharesReserved(e) => &e.portfolio_id,
            Self::SharesReleased(e) => &e.portfolio_id,
            Self::FillApplied(e) => &e.portfolio_id,
        }
    }

    /// Get the owning user for this event.
    #[must_use]
    pub fn user_id(&self) -> &UserId {
        match self {
            Self::FundsDeposited(e) => &e.user_id,
            Self::FundsWithdrawn(e) => &e.user_id,
            Self::FundsReserved(e) => &e.user_id,
            Self::ReservationReleased(e) => &e.user_id,
            Self::SharesReserved(e) => &e.user_id,
            Self::SharesReleased(e) => &e.user_id,
            Self::FillApplied(e) => &e.user_id,
        }
    }

    /// Get the timestamp when this event occurred.
    #[must_use]
    pub fn occurred_at(&self) -> Timestamp {
        match self {
            Self::FundsDeposited(e) => e.occurred_at,
            Self::FundsWithdrawn(e) => e.occurred_at,
            Self::FundsReserved(e) => e.occurred_at,
            Self::ReservationReleased(e) => e.occurred_at,
            Self::SharesReserved(e) => e.occurred_at,
            Self::SharesReleased(e) => e.occurred_at,
            Self::FillApplied(e) => e.occurred_at,
        }
    }

    /// Get the event type name.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::FundsDeposited(_) => "FUNDS_DEPOSITED",
            Self::FundsWithdrawn(_) => "FUNDS_WITHDRAWN",
            Self::FundsReserved(_) => "FUNDS_RESERVED",
            Self::ReservationReleased(_) => "RESERVATION_RELEASED",
            Self::SharesReserved(_) => "SHARES_RESERVED",
            Self::SharesReleased(_) => "SHARES_RELEASED",
            Self::FillApplied(_) => "FILL_APPLIED",
        }
    }
}

/// Event: cash deposited into the portfolio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundsDeposited {
    /// Portfolio ID.
    pub portfolio_id: PortfolioId,
    /// Owning user.
    pub user_id: UserId,
    /// Amount deposited.
    pub amount: Money,
    /// Cash balance after the deposit.
    pub cash_balance: Money,
    /// When the event occurred.
    pub occurred_at: Timestamp,
}

/// Event: cash withdrawn from the portfolio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundsWithdrawn {
    /// Portfolio ID.
    pub portfolio_id: PortfolioId,
    /// Owning user.
    pub user_id: UserId,
    /// Amount withdrawn.
    pub amount: Money,
    /// Cash balance after the withdrawal.
    pub cash_balance: Money,
    /// When the event occurred.
    pub occurred_at: Timestamp,
}

/// Event: cash reserved against a pending buy order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundsReserved {
    /// Portfolio ID.
    pub portfolio_id: PortfolioId,
    /// Owning user.
    pub user_id: UserId,
    /// Order the reservation covers.
    pub order_id: OrderId,
    /// Amount reserved.
    pub amount: Money,
    /// Total reserved cash after this reservation.
    pub reserved_cash: Money,
    /// When the event occurred.
    pub occurred_at: Timestamp,
}

/// Event: part of the cash reservation released.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationReleased {
    /// Portfolio ID.
    pub portfolio_id: PortfolioId,
    /// Owning user.
    pub user_id: UserId,
    /// Order whose reservation was released.
    pub order_id: OrderId,
    /// Amount actually released.
    pub amount: Money,
    /// Total reserved cash after the release.
    pub reserved_cash: Money,
    /// When the event occurred.
    pub occurred_at: Timestamp,
}

/// Event: shares reserved against a pending sell order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharesReserved {
    /// Portfolio ID.
    pub portfolio_id: PortfolioId,
    /// Owning user.
    pub user_id: UserId,
    /// Order the reservation covers.
    pub order_id: OrderId,
    /// Symbol reserved.
    pub symbol: Symbol,
    /// Quantity reserved.
    pub quantity: Quantity,
    /// Total reserved shares of this symbol after the reservation.
    pub reserved_shares: Quantity,
    /// When the event occurred.
    pub occurred_at: Timestamp,
}

/// Event: part of a share reservation released.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharesReleased {
    /// Portfolio ID.
    pub portfolio_id: PortfolioId,
    /// Owning user.
    pub user_id: UserId,
    /// Order whose reservation was released.
    pub order_id: OrderId,
    /// Symbol released.
    pub symbol: Symbol,
    /// Quantity actually released.
    pub quantity: Quantity,
    /// Total reserved shares of this symbol after the release.
    pub reserved_shares: Quantity,
    /// When the event occurred.
    pub occurred_at: Timestamp,
}

/// Event: a fill settled against the portfolio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillApplied {
    /// Portfolio ID.
    pub portfolio_id: PortfolioId,
    /// Owning user.
    pub user_id: UserId,
    /// Order the fill belongs to.
    pub order_id: OrderId,
    /// Symbol traded.
    pub symbol: Symbol,
    /// Side of the fill.
    pub side: OrderSide,
    /// Fill quantity.
    pub quantity: Quantity,
    /// Fill price.
    pub price: Money,
    /// Signed cash movement (negative for buys, positive for sells).
    pub cash_delta: Money,
    /// Position quantity after settlement.
    pub position_quantity: Quantity,
    /// Position average cost after settlement.
    pub position_avg_cost: Money,
    /// When the event occurred.
    pub occurred_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn event_type_names() {
        let event = PortfolioEvent::FundsDeposited(FundsDeposited {
            portfolio_id: PortfolioId::new("pf-1"),
            user_id: UserId::new("user-1"),
            amount: Money::new(dec!(1000)),
            cash_balance: Money::new(dec!(1000)),
            occurred_at: Timestamp::now(),
        });

        assert_eq!(event.event_type(), "FUNDS_DEPOSITED");
        assert_eq!(event.portfolio_id().as_str(), "pf-1");
        assert_eq!(event.user_id().as_str(), "user-1");
    }

    #[test]
    fn event_serde_tagging() {
        let event = PortfolioEvent::FillApplied(FillApplied {
            portfolio_id: PortfolioId::new("pf-1"),
            user_id: UserId::new("user-1"),
            order_id: OrderId::new("ord-1"),
            symbol: Symbol::new("AAPL"),
            side: OrderSide::Buy,
            quantity: Quantity::from_i64(5),
            price: Money::new(dec!(100)),
            cash_delta: Money::new(dec!(-500)),
            position_quantity: Quantity::from_i64(5),
            position_avg_cost: Money::new(dec!(100)),
            occurred_at: Timestamp::now(),
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"FILL_APPLIED\""));

        let parsed: PortfolioEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }
}
