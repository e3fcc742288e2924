//! A holding in a single symbol.

use serde::{Deserialize, Serialize};

use crate::domain::shared::{Money, Quantity, Symbol};

/// Shares held in one symbol, with the reservation taken against
/// pending sells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    symbol: Symbol,
    quantity: Quantity,
    /// Quantity-weighted average cost, 2 decimal places.
    average_cost: Money,
    /// Shares committed to pending sell orders.
    reserved: Quantity,
}

impl Position {
    /// Create an empty position.
    #[must_use]
    pub const fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            quantity: Quantity::ZERO,
            average_cost: Money::ZERO,
            reserved: Quantity::ZERO,
        }
    }

    /// Rebuild a position from stored state.
    #[must_use]
    pub const fn reconstitute(
        symbol: Symbol,
        quantity: Quantity,
        average_cost: Money,
        reserved: Quantity,
    ) -> Self {
        Self {
            symbol,
            quantity,
            average_cost,
            reserved,
        }
    }

    /// Get the symbol.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Get the held quantity.
    #[must_use]
    pub const fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Get the average cost per share.
    #[must_use]
    pub const fn average_cost(&self) -> Money {
        self.average_cost
    }

    /// Get the quantity reserved for pending sells.
    #[must_use]
    pub const fn reserved(&self) -> Quantity {
        self.reserved
    }

    /// Shares held but not reserved.
    #[must_use]
    pub fn available(&self) -> Quantity {
        self.quantity - self.reserved
    }

    /// True when the position holds no shares.
    #[must_use]
    pub fn is_flat(&self) -> bool {
        self.quantity.is_zero()
    }

    /// Add shares at a price, recomputing the quantity-weighted average
    /// cost at 2 decimal places.
    pub(super) fn add(&mut self, qty: Quantity, price: Money) {
        let old_notional = self.average_cost * self.quantity.amount();
        let new_quantity = self.quantity + qty;
        self.average_cost = ((old_notional + price * qty.amount()) / new_quantity.amount())
            .round_cash();
        self.quantity = new_quantity;
    }

    /// Remove sold shares, releasing up to `qty` of the reservation.
    /// Average cost resets to zero once the position is flat.
    pub(super) fn reduce(&mut self, qty: Quantity) {
        self.quantity = self.quantity - qty;
        self.reserved = self.reserved - qty.min(self.reserved);
        if self.quantity.is_zero() {
            self.average_cost = Money::ZERO;
        }
    }

    pub(super) fn reserve(&mut self, qty: Quantity) {
        self.reserved = self.reserved + qty;
    }

    /// Release up to `qty` reserved shares; returns the amount released.
    pub(super) fn release(&mut self, qty: Quantity) -> Quantity {
        let released = qty.min(self.reserved);
        self.reserved = self.reserved - released;
        released
    }
}
