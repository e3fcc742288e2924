//! Quote-driven execution pass.
//!
//! One pass per symbol per quote tick: under the symbol permit, propose
//! fills with the matching engine, apply them to the aggregates, cancel
//! whatever immediate-or-cancel remainder is left, and commit everything
//! with the events raised. No events means no writes.

use std::sync::Arc;

use tracing::{debug, info};

use crate::application::ports::{QuoteFeedPort, TradingUnitOfWork};
use crate::domain::shared::Symbol;
use crate::domain::trading::services::{FillPolicy, MatchingEngine};
use crate::domain::trading::value_objects::CancelReason;
use crate::domain::trading::{Order, OrderRepository, TradingEvent};
use crate::execution::SymbolGate;
use crate::messaging::{IntegrationEvent, IntegrationEventMapper};

use super::UseCaseError;

/// Runs quote-driven execution passes.
pub struct QuotePassUseCase<P: FillPolicy> {
    orders: Arc<dyn OrderRepository>,
    trading_uow: Arc<dyn TradingUnitOfWork>,
    quotes: Arc<dyn QuoteFeedPort>,
    gate: Arc<SymbolGate>,
    engine: MatchingEngine<P>,
}

impl<P: FillPolicy> QuotePassUseCase<P> {
    /// Create the use case.
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        trading_uow: Arc<dyn TradingUnitOfWork>,
        quotes: Arc<dyn QuoteFeedPort>,
        gate: Arc<SymbolGate>,
        engine: MatchingEngine<P>,
    ) -> Self {
        Self {
            orders,
            trading_uow,
            quotes,
            gate,
            engine,
        }
    }

    /// Run one pass for a symbol; returns the number of fills applied.
    ///
    /// # Errors
    ///
    /// Returns error if a port fails or an aggregate rejects a fill.
    pub async fn execute(&self, symbol: &Symbol) -> Result<usize, UseCaseError> {
        let _permit = self.gate.acquire(symbol).await;

        let Some(quote) = self.quotes.get(symbol).await? else {
            debug!(symbol = %symbol, "no quote available, skipping pass");
            return Ok(0);
        };

        let mut orders = self.orders.find_open_by_symbol(symbol).await?;
        let proposals = self.engine.propose_fills(&quote, &orders);

        let mut events: Vec<TradingEvent> = Vec::new();
        let mut fill_count = 0;
        for proposal in &proposals {
            if let Some(order) = orders.iter_mut().find(|o| o.id() == &proposal.order_id) {
                events.push(order.apply_fill(proposal.quantity, proposal.price)?);
                fill_count += 1;
            }
        }

        events.extend(cancel_immediate_remainders(&mut orders)?);
        if events.is_empty() {
            return Ok(0);
        }

        let mapped = map_events(&events)?;
        self.trading_uow.commit(&orders, &mapped).await?;

        info!(
            symbol = %symbol,
            fills = fill_count,
            events = events.len(),
            "quote pass committed"
        );
        Ok(fill_count)
    }
}

/// IOC and FOK orders do not rest: whatever the pass left open is
/// canceled before commit.
pub(super) fn cancel_immediate_remainders(
    orders: &mut [Order],
) -> Result<Vec<TradingEvent>, UseCaseError> {
    let mut events = Vec::new();
    for order in orders.iter_mut() {
        if order.time_in_force().is_immediate() && order.status().can_fill() {
            let reason = if order.time_in_force().is_all_or_nothing() {
                CancelReason::fok_unfilled()
            } else {
                CancelReason::ioc_unfilled()
            };
            events.push(order.cancel(reason)?);
        }
    }
    Ok(events)
}

pub(super) fn map_events(events: &[TradingEvent]) -> Result<Vec<IntegrationEvent>, UseCaseError> {
    Ok(events
        .iter()
        .map(IntegrationEventMapper::from_trading)
        .collect::<Result<Vec<_>, _>>()?)
}
