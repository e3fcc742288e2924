//! Portfolio Aggregate Root
//!
//! Per-user cash and positions, with the reservations taken against open
//! orders. Invariants: available cash is never negative, and reserved
//! shares never exceed the position quantity. Failed operations leave the
//! aggregate untouched.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::portfolio::errors::PortfolioError;
use crate::domain::portfolio::events::{
    FillApplied, FundsDeposited, FundsReserved, FundsWithdrawn, PortfolioEvent,
    ReservationReleased, SharesReleased, SharesReserved,
};
use crate::domain::shared::{Money, OrderId, PortfolioId, Quantity, Symbol, Timestamp, UserId};
use crate::domain::trading::value_objects::OrderSide;

use super::position::Position;

/// Parameters for reconstituting a Portfolio from storage.
#[derive(Debug, Clone)]
pub struct ReconstitutedPortfolioParams {
    /// Portfolio identifier.
    pub id: PortfolioId,
    /// Owning user.
    pub user_id: UserId,
    /// Cash balance.
    pub cash: Money,
    /// Cash reserved against pending buys.
    pub reserved_cash: Money,
    /// Positions keyed by symbol.
    pub positions: Vec<Position>,
}

/// Portfolio Aggregate Root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    id: PortfolioId,
    user_id: UserId,
    cash: Money,
    reserved_cash: Money,
    positions: HashMap<Symbol, Position>,
}

impl Portfolio {
    /// Create an empty portfolio for a user.
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        Self {
            id: PortfolioId::generate(),
            user_id,
            cash: Money::ZERO,
            reserved_cash: Money::ZERO,
            positions: HashMap::new(),
        }
    }

    /// Reconstitute a portfolio from stored state (no events generated).
    #[must_use]
    pub fn reconstitute(params: ReconstitutedPortfolioParams) -> Self {
        Self {
            id: params.id,
            user_id: params.user_id,
            cash: params.cash,
            reserved_cash: params.reserved_cash,
            positions: params
                .positions
                .into_iter()
                .map(|p| (p.symbol().clone(), p))
                .collect(),
        }
    }

    /// Get the portfolio ID.
    #[must_use]
    pub const fn id(&self) -> &PortfolioId {
        &self.id
    }

    /// Get the owning user.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Get the cash balance.
    #[must_use]
    pub const fn cash(&self) -> Money {
        self.cash
    }

    /// Get the cash reserved against pending buys.
    #[must_use]
    pub const fn reserved_cash(&self) -> Money {
        self.reserved_cash
    }

    /// Cash not committed to reservations.
    #[must_use]
    pub fn available_cash(&self) -> Money {
        self.cash - self.reserved_cash
    }

    /// Get the position for a symbol, if one is held.
    #[must_use]
    pub fn position(&self, symbol: &Symbol) -> Option<&Position> {
        self.positions.get(symbol)
    }

    /// All held positions.
    #[must_use]
    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    // ========================================================================
    // Funding
    // ========================================================================

    /// Deposit cash.
    ///
    /// # Errors
    ///
    /// Returns error if the amount is not positive.
    pub fn deposit(&mut self, amount: Money) -> Result<PortfolioEvent, PortfolioError> {
        Self::require_positive(amount, "deposit")?;

        let amount = amount.round_cash();
        self.cash = self.cash + amount;

        Ok(PortfolioEvent::FundsDeposited(FundsDeposited {
            portfolio_id: self.id.clone(),
            user_id: self.user_id.clone(),
            amount,
            cash_balance: self.cash,
            occurred_at: Timestamp::now(),
        }))
    }

    /// Withdraw cash, bounded by the available (unreserved) balance.
    ///
    /// # Errors
    ///
    /// Returns error if the amount is not positive or exceeds available cash.
    pub fn withdraw(&mut self, amount: Money) -> Result<PortfolioEvent, PortfolioError> {
        Self::require_positive(amount, "withdrawal")?;

        let amount = amount.round_cash();
        if amount > self.available_cash() {
            return Err(PortfolioError::InsufficientFunds {
                requested: amount.to_string(),
                available: self.available_cash().to_string(),
            });
        }

        self.cash = self.cash - amount;

        Ok(PortfolioEvent::FundsWithdrawn(FundsWithdrawn {
            portfolio_id: self.id.clone(),
            user_id: self.user_id.clone(),
            amount,
            cash_balance: self.cash,
            occurred_at: Timestamp::now(),
        }))
    }

    // ========================================================================
    // Reservations
    // ========================================================================

    /// Reserve cash against a pending buy order.
    ///
    /// # Errors
    ///
    /// Returns error if the amount is not positive or exceeds available cash.
    pub fn reserve_funds(
        &mut self,
        order_id: &OrderId,
        amount: Money,
    ) -> Result<PortfolioEvent, PortfolioError> {
        Self::require_positive(amount, "reservation")?;

        let amount = amount.round_cash();
        if amount > self.available_cash() {
            return Err(PortfolioError::InsufficientFunds {
                requested: amount.to_string(),
                available: self.available_cash().to_string(),
            });
        }

        self.reserved_cash = self.reserved_cash + amount;

        Ok(PortfolioEvent::FundsReserved(FundsReserved {
            portfolio_id: self.id.clone(),
            user_id: self.user_id.clone(),
            order_id: order_id.clone(),
            amount,
            reserved_cash: self.reserved_cash,
            occurred_at: Timestamp::now(),
        }))
    }

    /// Release up to `amount` of the cash reservation.
    ///
    /// Releasing more than is reserved releases the whole reservation;
    /// releasing when nothing is reserved is a silent no-op and raises no
    /// event.
    ///
    /// # Errors
    ///
    /// Returns error if the amount is negative.
    pub fn release_funds(
        &mut self,
        order_id: &OrderId,
        amount: Money,
    ) -> Result<Option<PortfolioEvent>, PortfolioError> {
        if amount.is_negative() {
            return Err(PortfolioError::InvalidAmount {
                field: "release".to_string(),
                message: "Release amount must not be negative".to_string(),
            });
        }

        let released = amount.round_cash().min(self.reserved_cash);
        if !released.is_positive() {
            return Ok(None);
        }

        self.reserved_cash = self.reserved_cash - released;

        Ok(Some(PortfolioEvent::ReservationReleased(
            ReservationReleased {
                portfolio_id: self.id.clone(),
                user_id: self.user_id.clone(),
                order_id: order_id.clone(),
                amount: released,
                reserved_cash: self.reserved_cash,
                occurred_at: Timestamp::now(),
            },
        )))
    }

    /// Reserve shares against a pending sell order.
    ///
    /// # Errors
    ///
    /// Returns error if the quantity is not positive or exceeds the
    /// unreserved position quantity.
    pub fn reserve_shares(
        &mut self,
        order_id: &OrderId,
        symbol: &Symbol,
        quantity: Quantity,
    ) -> Result<PortfolioEvent, PortfolioError> {
        if !quantity.is_positive() {
            return Err(PortfolioError::InvalidAmount {
                field: "share reservation".to_string(),
                message: "Quantity must be positive".to_string(),
            });
        }

        let available = self.positions.get(symbol).map_or(Quantity::ZERO, Position::available);
        if quantity > available {
            return Err(PortfolioError::InsufficientShares {
                symbol: symbol.to_string(),
                requested: quantity.to_string(),
                available: available.to_string(),
            });
        }

        // Position must exist for available to be positive
        let position = self
            .positions
            .get_mut(symbol)
            .ok_or_else(|| PortfolioError::InsufficientShares {
                symbol: symbol.to_string(),
                requested: quantity.to_string(),
                available: Quantity::ZERO.to_string(),
            })?;
        position.reserve(quantity);
        let reserved_shares = position.reserved();

        Ok(PortfolioEvent::SharesReserved(SharesReserved {
            portfolio_id: self.id.clone(),
            user_id: self.user_id.clone(),
            order_id: order_id.clone(),
            symbol: symbol.clone(),
            quantity,
            reserved_shares,
            occurred_at: Timestamp::now(),
        }))
    }

    /// Release up to `quantity` reserved shares of a symbol.
    ///
    /// Releasing with nothing reserved is a silent no-op.
    ///
    /// # Errors
    ///
    /// Returns error if the quantity is negative.
    pub fn release_shares(
        &mut self,
        order_id: &OrderId,
        symbol: &Symbol,
        quantity: Quantity,
    ) -> Result<Option<PortfolioEvent>, PortfolioError> {
        if quantity < Quantity::ZERO {
            return Err(PortfolioError::InvalidAmount {
                field: "share release".to_string(),
                message: "Quantity must not be negative".to_string(),
            });
        }

        let Some(position) = self.positions.get_mut(symbol) else {
            return Ok(None);
        };
        let released = position.release(quantity);
        if !released.is_positive() {
            return Ok(None);
        }
        let reserved_shares = position.reserved();

        Ok(Some(PortfolioEvent::SharesReleased(SharesReleased {
            portfolio_id: self.id.clone(),
            user_id: self.user_id.clone(),
            order_id: order_id.clone(),
            symbol: symbol.clone(),
            quantity: released,
            reserved_shares,
            occurred_at: Timestamp::now(),
        })))
    }

    // ========================================================================
    // Settlement
    // ========================================================================

    /// Settle a fill against the portfolio.
    ///
    /// Buys release the matching cash reservation, debit the notional, and
    /// fold the fill into the position's average cost. The reservation was
    /// taken at the limit price, so the release is `limit_price` per unit
    /// filled, not the fill price; a price-improved fill returns the
    /// surplus. Market buys (`limit_price` = `None`) carried no reservation
    /// and release nothing. Sells reduce the position, release reserved
    /// shares, and credit the proceeds. On failure the portfolio is
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns error if a buy's notional exceeds the cash balance, or a
    /// sell's quantity exceeds the position.
    pub fn apply_fill(
        &mut self,
        order_id: &OrderId,
        side: OrderSide,
        symbol: &Symbol,
        quantity: Quantity,
        price: Money,
        limit_price: Option<Money>,
    ) -> Result<PortfolioEvent, PortfolioError> {
        if !quantity.is_positive() {
            return Err(PortfolioError::InvalidAmount {
                field: "fill quantity".to_string(),
                message: "Fill quantity must be positive".to_string(),
            });
        }

        let notional = (price * quantity.amount()).round_cash();
        let cash_delta = match side {
            OrderSide::Buy => {
                if notional > self.cash {
                    return Err(PortfolioError::InsufficientFunds {
                        requested: notional.to_string(),
                        available: self.cash.to_string(),
                    });
                }
                let reserved_for_fill = limit_price
                    .map_or(Money::ZERO, |limit| (limit * quantity.amount()).round_cash());
                self.reserved_cash =
                    self.reserved_cash - reserved_for_fill.min(self.reserved_cash);
                self.cash = self.cash - notional;
                self.positions
                    .entry(symbol.clone())
                    .or_insert_with(|| Position::new(symbol.clone()))
                    .add(quantity, price);
                -notional
            }
            OrderSide::Sell => {
                let held = self
                    .positions
                    .get(symbol)
                    .map_or(Quantity::ZERO, Position::quantity);
                if quantity > held {
                    return Err(PortfolioError::InsufficientShares {
                        symbol: symbol.to_string(),
                        requested: quantity.to_string(),
                        available: held.to_string(),
                    });
                }
                if let Some(position) = self.positions.get_mut(symbol) {
                    position.reduce(quantity);
                }
                self.cash = self.cash + notional;
                notional
            }
        };

        let (position_quantity, position_avg_cost) = self
            .positions
            .get(symbol)
            .map_or((Quantity::ZERO, Money::ZERO), |p| {
                (p.quantity(), p.average_cost())
            });

        // Drop empty positions with no outstanding reservation
        if self
            .positions
            .get(symbol)
            .is_some_and(|p| p.is_flat() && p.reserved().is_zero())
        {
            self.positions.remove(symbol);
        }

        Ok(PortfolioEvent::FillApplied(FillApplied {
            portfolio_id: self.id.clone(),
            user_id: self.user_id.clone(),
            order_id: order_id.clone(),
            symbol: symbol.clone(),
            side,
            quantity,
            price,
            cash_delta,
            position_quantity,
            position_avg_cost,
            occurred_at: Timestamp::now(),
        }))
    }

    fn require_positive(amount: Money, field: &str) -> Result<(), PortfolioError> {
        if !amount.is_positive() {
            return Err(PortfolioError::InvalidAmount {
                field: field.to_string(),
                message: "Amount must be positive".to_string(),
            });
        }
        Ok(())
    }
}
