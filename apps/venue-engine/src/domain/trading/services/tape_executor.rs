//! Tape-driven execution.
//!
//! A trade print is external liquidity flowing past the venue: open orders
//! willing to trade at the printed price participate in it. Opposing orders
//! pair against each other first; whatever one side has left trades against
//! an implicit dealer at the print price. Any print size left after the
//! dealer pass is liquidity the venue did not want, and is dropped.

use std::cmp::Ordering;

use crate::domain::shared::{Money, Quantity};
use crate::domain::trading::aggregate::Order;
use crate::domain::trading::errors::TradingError;
use crate::domain::trading::events::TradingEvent;
use crate::domain::trading::value_objects::{OrderSide, ProposedFill, TradePrint};

/// The outcome of replaying one print against a symbol's open orders.
#[derive(Debug, Default)]
pub struct TapeExecution {
    /// Fills applied, in execution order.
    pub fills: Vec<ProposedFill>,
    /// Domain events raised by the fills, in execution order.
    pub events: Vec<TradingEvent>,
}

impl TapeExecution {
    /// True when the print produced no executions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Replays trade prints against open orders at the print price.
pub struct TradePrintExecutor;

impl TradePrintExecutor {
    /// Execute one print against `orders`, mutating the filled aggregates.
    ///
    /// Buys are eligible when market or limit at or above the print price,
    /// sells symmetrically; each side is ordered by aggressiveness (market
    /// first, then limit) with arrival time breaking ties. Fill-or-kill
    /// orders are skipped whenever the available quantity cannot cover
    /// their entire remaining amount.
    ///
    /// # Errors
    ///
    /// Returns error if applying a fill to an aggregate fails.
    pub fn execute(
        print: &TradePrint,
        orders: &mut [Order],
    ) -> Result<TapeExecution, TradingError> {
        let mut buys = Self::eligible(print, orders, OrderSide::Buy);
        let mut sells = Self::eligible(print, orders, OrderSide::Sell);

        let mut execution = TapeExecution::default();
        let mut remaining_print = print.quantity;
        let mut bi = 0;
        let mut si = 0;

        // Pair opposing orders at the print price, best-priority first.
        while remaining_print.is_positive() && bi < buys.len() && si < sells.len() {
            let buy_rem = orders[buys[bi]].remaining_quantity();
            let sell_rem = orders[sells[si]].remaining_quantity();
            let qty = remaining_print.min(buy_rem).min(sell_rem);

            if orders[buys[bi]].time_in_force().is_all_or_nothing() && qty < buy_rem {
                bi += 1;
                continue;
            }
            if orders[sells[si]].time_in_force().is_all_or_nothing() && qty < sell_rem {
                si += 1;
                continue;
            }

            Self::fill(&mut execution, &mut orders[buys[bi]], qty, print.price)?;
            Self::fill(&mut execution, &mut orders[sells[si]], qty, print.price)?;
            remaining_print = remaining_print - qty;

            if orders[buys[bi]].remaining_quantity().is_zero() {
                bi += 1;
            }
            if orders[sells[si]].remaining_quantity().is_zero() {
                si += 1;
            }
        }

        // One side may survive; it trades against the dealer for whatever
        // print size is left.
        buys.drain(..bi);
        sells.drain(..si);
        for idx in buys.into_iter().chain(sells) {
            if !remaining_print.is_positive() {
                break;
            }
            let rem = orders[idx].remaining_quantity();
            let qty = remaining_print.min(rem);
            if orders[idx].time_in_force().is_all_or_nothing() && qty < rem {
                continue;
            }
            Self::fill(&mut execution, &mut orders[idx], qty, print.price)?;
            remaining_print = remaining_print - qty;
        }

        Ok(execution)
    }

    /// Candidate indexes for one side, best priority first.
    fn eligible(print: &TradePrint, orders: &[Order], side: OrderSide) -> Vec<usize> {
        let mut candidates: Vec<usize> = orders
            .iter()
            .enumerate()
            .filter(|(_, order)| {
                order.symbol() == &print.symbol
                    && order.side() == side
                    && order.is_executable()
                    && order.limit_price().is_none_or(|limit| match side {
                        OrderSide::Buy => limit >= print.price,
                        OrderSide::Sell => limit <= print.price,
                    })
            })
            .map(|(idx, _)| idx)
            .collect();

        candidates.sort_by(|&a, &b| {
            let (oa, ob) = (&orders[a], &orders[b]);
            let by_price = match (oa.limit_price(), ob.limit_price()) {
                // Market orders outrank any limit
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(pa), Some(pb)) => match side {
                    OrderSide::Buy => pb.cmp(&pa),
                    OrderSide::Sell => pa.cmp(&pb),
                },
            };
            by_price.then(oa.created_at().cmp(&ob.created_at()))
        });
        candidates
    }

    fn fill(
        execution: &mut TapeExecution,
        order: &mut Order,
        qty: Quantity,
        price: Money,
    ) -> Result<(), TradingError> {
        let event = order.apply_fill(qty, price)?;
        execution.fills.push(ProposedFill {
            order_id: order.id().clone(),
            quantity: qty,
            price,
        });
        execution.events.push(event);
        Ok(())
    }
}
