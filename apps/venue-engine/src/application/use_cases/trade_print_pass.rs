//! Tape-driven execution pass.

use std::sync::Arc;

use tracing::info;

use crate::application::ports::TradingUnitOfWork;
use crate::domain::trading::services::TradePrintExecutor;
use crate::domain::trading::value_objects::TradePrint;
use crate::domain::trading::OrderRepository;
use crate::execution::SymbolGate;

use super::quote_pass::{cancel_immediate_remainders, map_events};
use super::UseCaseError;

/// Replays tape prints against the symbol's open orders.
pub struct TradePrintPassUseCase {
    orders: Arc<dyn OrderRepository>,
    trading_uow: Arc<dyn TradingUnitOfWork>,
    gate: Arc<SymbolGate>,
}

impl TradePrintPassUseCase {
    /// Create the use case.
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        trading_uow: Arc<dyn TradingUnitOfWork>,
        gate: Arc<SymbolGate>,
    ) -> Self {
        Self {
            orders,
            trading_uow,
            gate,
        }
    }

    /// Run one pass for a print; returns the number of fills applied.
    /// A print that fills nothing and cancels nothing skips all writes.
    ///
    /// # Errors
    ///
    /// Returns error if a port fails or an aggregate rejects a fill.
    pub async fn execute(&self, print: &TradePrint) -> Result<usize, UseCaseError> {
        let _permit = self.gate.acquire(&print.symbol).await;

        let mut orders = self.orders.find_open_by_symbol(&print.symbol).await?;
        let execution = TradePrintExecutor::execute(print, &mut orders)?;

        let mut events = execution.events;
        events.extend(cancel_immediate_remainders(&mut orders)?);
        if events.is_empty() {
            return Ok(0);
        }

        let mapped = map_events(&events)?;
        self.trading_uow.commit(&orders, &mapped).await?;

        info!(
            symbol = %print.symbol,
            print_quantity = %print.quantity,
            fills = execution.fills.len(),
            events = events.len(),
            "tape pass committed"
        );
        Ok(execution.fills.len())
    }
}
