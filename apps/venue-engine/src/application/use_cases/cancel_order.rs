//! Cancel order use case.

use std::sync::Arc;

use tracing::info;

use crate::application::ports::TradingUnitOfWork;
use crate::domain::shared::OrderId;
use crate::domain::trading::value_objects::CancelReason;
use crate::domain::trading::{Order, OrderRepository, TradingError};
use crate::execution::SymbolGate;
use crate::messaging::IntegrationEventMapper;

use super::UseCaseError;

/// Cancels an open order on user request.
pub struct CancelOrderUseCase {
    orders: Arc<dyn OrderRepository>,
    trading_uow: Arc<dyn TradingUnitOfWork>,
    gate: Arc<SymbolGate>,
}

impl CancelOrderUseCase {
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

    /// Cancel an order. The symbol permit is held while the order is
    /// re-read and canceled so a concurrent execution pass cannot fill it
    /// mid-cancel.
    ///
    /// # Errors
    ///
    /// Returns error if the order does not exist, is already terminal, or
    /// the commit fails.
    pub async fn execute(&self, order_id: &OrderId) -> Result<Order, UseCaseError> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| TradingError::NotFound {
                order_id: order_id.to_string(),
            })?;

        let _permit = self.gate.acquire(order.symbol()).await;

        // Re-read under the permit; a pass may have filled it meanwhile
        let mut order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| TradingError::NotFound {
                order_id: order_id.to_string(),
            })?;

        let event = order.cancel(CancelReason::user_requested())?;
        let mapped = IntegrationEventMapper::from_trading(&event)?;
        self.trading_uow.commit(&[order.clone()], &[mapped]).await?;

        info!(order_id = %order.id(), symbol = %order.symbol(), "order canceled");
        Ok(order)
    }
}
