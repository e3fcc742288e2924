//! Resting limit order book with price-time priority.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::shared::{Money, OrderId, Quantity, Symbol, Timestamp};
use crate::domain::trading::aggregate::Order;
use crate::domain::trading::value_objects::{OrderSide, OrderType};

/// A resting order as tracked by the book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookEntry {
    /// Resting order id.
    pub order_id: OrderId,
    /// Limit price.
    pub price: Money,
    /// Open quantity at the time of the last upsert.
    pub remaining: Quantity,
    /// Order creation time, for FIFO tie-breaking.
    pub created_at: Timestamp,
}

/// An internal crossing the book proposes between its own best bid and ask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposedTrade {
    /// Buy side of the crossing.
    pub buy_order_id: OrderId,
    /// Sell side of the crossing.
    pub sell_order_id: OrderId,
    /// Trade quantity.
    pub quantity: Quantity,
    /// Execution price, midpoint of the crossed prices.
    pub price: Money,
}

#[derive(Debug, Clone, Default)]
struct SymbolBook {
    /// Sorted best-first: price desc, then created_at asc.
    bids: Vec<BookEntry>,
    /// Sorted best-first: price asc, then created_at asc.
    asks: Vec<BookEntry>,
}

impl SymbolBook {
    fn side_mut(&mut self, side: OrderSide) -> &mut Vec<BookEntry> {
        match side {
            OrderSide::Buy => &mut self.bids,
            OrderSide::Sell => &mut self.asks,
        }
    }

    fn sort(&mut self) {
        self.bids
            .sort_by(|a, b| b.price.cmp(&a.price).then(a.created_at.cmp(&b.created_at)));
        self.asks
            .sort_by(|a, b| a.price.cmp(&b.price).then(a.created_at.cmp(&b.created_at)));
    }

    fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

/// Collection of per-symbol resting limit orders.
///
/// Only open limit orders rest in the book; market orders execute against
/// quotes and prints and never rest. Entries are keyed by order id, so
/// re-upserting an order replaces its entry in place.
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    books: HashMap<Symbol, SymbolBook>,
}

impl OrderBook {
    /// Create an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or refresh an order's resting entry.
    ///
    /// No-op unless the order is a limit order that is open with positive
    /// remaining quantity; the caller removes terminal orders explicitly.
    pub fn upsert(&mut self, order: &Order) {
        let Some(price) = order.limit_price() else {
            return;
        };
        if order.order_type() != OrderType::Limit || !order.is_executable() {
            return;
        }

        let book = self.books.entry(order.symbol().clone()).or_default();
        let side = book.side_mut(order.side());
        side.retain(|e| e.order_id != *order.id());
        side.push(BookEntry {
            order_id: order.id().clone(),
            price,
            remaining: order.remaining_quantity(),
            created_at: order.created_at(),
        });
        book.sort();
    }

    /// Remove an order's resting entry, if present.
    pub fn remove(&mut self, symbol: &Symbol, order_id: &OrderId) {
        if let Some(book) = self.books.get_mut(symbol) {
            book.bids.retain(|e| e.order_id != *order_id);
            book.asks.retain(|e| e.order_id != *order_id);
            if book.is_empty() {
                self.books.remove(symbol);
            }
        }
    }

    /// Best (highest) resting bid for a symbol.
    #[must_use]
    pub fn best_bid(&self, symbol: &Symbol) -> Option<&BookEntry> {
        self.books.get(symbol).and_then(|b| b.bids.first())
    }

    /// Best (lowest) resting ask for a symbol.
    #[must_use]
    pub fn best_ask(&self, symbol: &Symbol) -> Option<&BookEntry> {
        self.books.get(symbol).and_then(|b| b.asks.first())
    }

    /// Number of resting entries for a symbol, both sides.
    #[must_use]
    pub fn depth(&self, symbol: &Symbol) -> usize {
        self.books
            .get(symbol)
            .map_or(0, |b| b.bids.len() + b.asks.len())
    }

    /// Propose at most one internal trade between the book's own best bid
    /// and best ask.
    ///
    /// Returns `None` unless the best bid price is at or above the best ask
    /// price. The proposed quantity is the minimum of both remaining sizes
    /// and `max_liquidity`; the price is the midpoint of the two limits.
    /// The book itself is not mutated; the caller applies fills to the
    /// aggregates and re-upserts or removes the entries.
    #[must_use]
    pub fn cross(&self, symbol: &Symbol, max_liquidity: Quantity) -> Option<ProposedTrade> {
        if !max_liquidity.is_positive() {
            return None;
        }
        let bid = self.best_bid(symbol)?;
        let ask = self.best_ask(symbol)?;
        if bid.price < ask.price {
            return None;
        }

        Some(ProposedTrade {
            buy_order_id: bid.order_id.clone(),
            sell_order_id: ask.order_id.clone(),
            quantity: bid.remaining.min(ask.remaining).min(max_liquidity),
            price: Money::midpoint(bid.price, ask.price),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::UserId;
    use crate::domain::trading::value_objects::TimeInForce;
    use rust_decimal_macros::dec;

    fn open_limit(side: OrderSide, qty: i64, price: &str) -> Order {
        let mut order = Order::limit(
            UserId::new("user-1"),
            Symbol::new("AAPL"),
            side,
            Quantity::from_i64(qty),
            Money::new(price.parse().unwrap()),
            TimeInForce::Gtc,
        )
        .unwrap();
        order.accept().unwrap();
        order
    }

    #[test]
    fn upsert_ignores_market_and_unaccepted_orders() {
        let mut book = OrderBook::new();

        let market = Order::market(
            UserId::new("user-1"),
            Symbol::new("AAPL"),
            OrderSide::Buy,
            Quantity::from_i64(10),
            TimeInForce::Gtc,
        )
        .unwrap();
        book.upsert(&market);

        let unaccepted = Order::limit(
            UserId::new("user-1"),
            Symbol::new("AAPL"),
            OrderSide::Buy,
            Quantity::from_i64(10),
            Money::new(dec!(100)),
            TimeInForce::Gtc,
        )
        .unwrap();
        book.upsert(&unaccepted);

        assert_eq!(book.depth(&Symbol::new("AAPL")), 0);
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut book = OrderBook::new();
        let mut order = open_limit(OrderSide::Buy, 100, "100.00");
        book.upsert(&order);

        order
            .apply_fill(Quantity::from_i64(40), Money::new(dec!(100)))
            .unwrap();
        book.upsert(&order);

        let symbol = Symbol::new("AAPL");
        assert_eq!(book.depth(&symbol), 1);
        assert_eq!(
            book.best_bid(&symbol).unwrap().remaining,
            Quantity::from_i64(60)
        );
    }

    #[test]
    fn bids_sorted_price_desc_then_time() {
        let mut book = OrderBook::new();
        let low = open_limit(OrderSide::Buy, 10, "99.00");
        let high = open_limit(OrderSide::Buy, 10, "101.00");
        book.upsert(&low);
        book.upsert(&high);

        let best = book.best_bid(&Symbol::new("AAPL")).unwrap();
        assert_eq!(best.order_id, *high.id());
    }

    #[test]
    fn ties_break_by_arrival_time() {
        let mut book = OrderBook::new();
        let first = open_limit(OrderSide::Sell, 10, "100.00");
        let second = open_limit(OrderSide::Sell, 10, "100.00");
        // Insert out of arrival order; the earlier created_at still wins
        book.upsert(&second);
        book.upsert(&first);

        let best = book.best_ask(&Symbol::new("AAPL")).unwrap();
        assert_eq!(best.order_id, *first.id());
    }

    #[test]
    fn remove_drops_entry() {
        let mut book = OrderBook::new();
        let order = open_limit(OrderSide::Buy, 10, "100.00");
        book.upsert(&order);

        let symbol = Symbol::new("AAPL");
        book.remove(&symbol, order.id());
        assert_eq!(book.depth(&symbol), 0);
        assert!(book.best_bid(&symbol).is_none());
    }

    #[test]
    fn cross_requires_crossed_prices() {
        let mut book = OrderBook::new();
        book.upsert(&open_limit(OrderSide::Buy, 10, "99.00"));
        book.upsert(&open_limit(OrderSide::Sell, 10, "101.00"));

        assert!(
            book.cross(&Symbol::new("AAPL"), Quantity::from_i64(100))
                .is_none()
        );
    }

    #[test]
    fn cross_prices_at_midpoint_capped_by_liquidity() {
        let mut book = OrderBook::new();
        let buy = open_limit(OrderSide::Buy, 100, "101.00");
        let sell = open_limit(OrderSide::Sell, 40, "100.00");
        book.upsert(&buy);
        book.upsert(&sell);

        let trade = book
            .cross(&Symbol::new("AAPL"), Quantity::from_i64(25))
            .unwrap();

        assert_eq!(trade.buy_order_id, *buy.id());
        assert_eq!(trade.sell_order_id, *sell.id());
        assert_eq!(trade.quantity, Quantity::from_i64(25));
        assert_eq!(trade.price, Money::new(dec!(100.5)));
    }

    #[test]
    fn cross_touching_prices_trades_at_that_price() {
        let mut book = OrderBook::new();
        book.upsert(&open_limit(OrderSide::Buy, 10, "100.00"));
        book.upsert(&open_limit(OrderSide::Sell, 10, "100.00"));

        let trade = book
            .cross(&Symbol::new("AAPL"), Quantity::from_i64(100))
            .unwrap();
        assert_eq!(trade.price, Money::new(dec!(100.00)));
        assert_eq!(trade.quantity, Quantity::from_i64(10));
    }

    #[test]
    fn cross_does_not_mutate_book() {
        let mut book = OrderBook::new();
        book.upsert(&open_limit(OrderSide::Buy, 10, "101.00"));
        book.upsert(&open_limit(OrderSide::Sell, 10, "100.00"));

        let symbol = Symbol::new("AAPL");
        let _ = book.cross(&symbol, Quantity::from_i64(100));
        assert_eq!(book.depth(&symbol), 2);
    }

    #[test]
    fn symbols_kept_separate() {
        let mut book = OrderBook::new();
        let mut msft = Order::limit(
            UserId::new("user-1"),
            Symbol::new("MSFT"),
            OrderSide::Buy,
            Quantity::from_i64(10),
            Money::new(dec!(400)),
            TimeInForce::Gtc,
        )
        .unwrap();
        msft.accept().unwrap();

        book.upsert(&open_limit(OrderSide::Buy, 10, "100.00"));
        book.upsert(&msft);

        assert_eq!(book.depth(&Symbol::new("AAPL")), 1);
        assert_eq!(book.depth(&Symbol::new("MSFT")), 1);
    }
}
