//! Maintenance sweep use case.
//!
//! Auto-cancels Day orders that outlived their UTC day. IOC and FOK
//! orders never reach this path: the execution pass cancels them itself.

use std::sync::Arc;

use tracing::info;

use crate::application::ports::TradingUnitOfWork;
use crate::domain::shared::Timestamp;
use crate::domain::trading::value_objects::CancelReason;
use crate::domain::trading::OrderRepository;
use crate::execution::SymbolGate;
use crate::messaging::IntegrationEventMapper;

use super::UseCaseError;

/// Expires Day orders past their end-of-day.
pub struct MaintenanceSweepUseCase {
    orders: Arc<dyn OrderRepository>,
    trading_uow: Arc<dyn TradingUnitOfWork>,
    gate: Arc<SymbolGate>,
}

impl MaintenanceSweepUseCase {
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

    /// Cancel every expired open order; returns the number canceled.
    ///
    /// Each cancellation happens under its symbol's permit, re-reading the
    /// order so a concurrent pass cannot race the expiry.
    ///
    /// # Errors
    ///
    /// Returns error if a port fails.
    pub async fn execute(&self) -> Result<usize, UseCaseError> {
        let now = Timestamp::now();
        let candidates = self.orders.find_open().await?;
        let mut canceled = 0;

        for candidate in candidates {
            if !candidate.is_expired(now) {
                continue;
            }

            let _permit = self.gate.acquire(candidate.symbol()).await;
            let Some(mut order) = self.orders.find_by_id(candidate.id()).await? else {
                continue;
            };
            if !order.is_expired(now) {
                continue;
            }

            let event = order.cancel(CancelReason::expired())?;
            let mapped = IntegrationEventMapper::from_trading(&event)?;
            self.trading_uow.commit(&[order.clone()], &[mapped]).await?;

            info!(order_id = %order.id(), symbol = %order.symbol(), "expired order canceled");
            canceled += 1;
        }

        Ok(canceled)
    }
}
