//! Place order use case.
//!
//! Validates the command, takes the reservation the order needs (cash for
//! limit buys, shares for sells; market buys reserve nothing because no
//! price is known yet), and accepts or rejects the order. Both outcomes
//! are committed with their integration events.

use std::sync::Arc;

use tracing::{info, warn};

use crate::application::ports::{PortfolioUnitOfWork, TradingUnitOfWork};
use crate::domain::portfolio::{Portfolio, PortfolioError, PortfolioEvent, PortfolioRepository};
use crate::domain::trading::value_objects::{OrderSide, OrderType, RejectReason};
use crate::domain::trading::{Order, PlaceOrderCommand};
use crate::messaging::IntegrationEventMapper;

use super::UseCaseError;

/// Accepts new orders into the venue.
pub struct PlaceOrderUseCase {
    trading_uow: Arc<dyn TradingUnitOfWork>,
    portfolios: Arc<dyn PortfolioRepository>,
    portfolio_uow: Arc<dyn PortfolioUnitOfWork>,
}

impl PlaceOrderUseCase {
    /// Create the use case.
    #[must_use]
    pub fn new(
        trading_uow: Arc<dyn TradingUnitOfWork>,
        portfolios: Arc<dyn PortfolioRepository>,
        portfolio_uow: Arc<dyn PortfolioUnitOfWork>,
    ) -> Self {
        Self {
            trading_uow,
            portfolios,
            portfolio_uow,
        }
    }

    /// Place an order. Returns the order in its post-placement state:
    /// `Accepted`, or `Rejected` when the portfolio cannot cover it.
    ///
    /// # Errors
    ///
    /// Returns error if the command is invalid or a commit fails.
    pub async fn execute(&self, cmd: PlaceOrderCommand) -> Result<Order, UseCaseError> {
        let mut order = Order::new(cmd)?;

        let mut portfolio = self
            .portfolios
            .find_by_user(order.user_id())
            .await?
            .unwrap_or_else(|| Portfolio::new(order.user_id().clone()));

        match self.take_reservation(&mut portfolio, &order) {
            Ok(Some(reservation)) => {
                let mapped = IntegrationEventMapper::from_portfolio(&reservation)?;
                self.portfolio_uow.commit(&portfolio, &[mapped]).await?;
            }
            Ok(None) => {}
            Err(reason) => {
                warn!(
                    order_id = %order.id(),
                    symbol = %order.symbol(),
                    reason = %reason.message,
                    "order rejected"
                );
                let event = order.reject(reason)?;
                let mapped = IntegrationEventMapper::from_trading(&event)?;
                self.trading_uow.commit(&[order.clone()], &[mapped]).await?;
                return Ok(order);
            }
        }

        let event = order.accept()?;
        let mapped = IntegrationEventMapper::from_trading(&event)?;
        self.trading_uow.commit(&[order.clone()], &[mapped]).await?;

        info!(
            order_id = %order.id(),
            symbol = %order.symbol(),
            side = ?order.side(),
            quantity = %order.quantity(),
            "order accepted"
        );
        Ok(order)
    }

    /// Take the reservation the order requires. `Err` carries the
    /// rejection reason when the portfolio cannot cover the order.
    fn take_reservation(
        &self,
        portfolio: &mut Portfolio,
        order: &Order,
    ) -> Result<Option<PortfolioEvent>, RejectReason> {
        match (order.side(), order.order_type(), order.limit_price()) {
            (OrderSide::Buy, OrderType::Limit, Some(limit)) => {
                let amount = (limit * order.quantity().amount()).round_cash();
                match portfolio.reserve_funds(order.id(), amount) {
                    Ok(event) => Ok(Some(event)),
                    Err(PortfolioError::InsufficientFunds { .. }) => {
                        Err(RejectReason::insufficient_funds())
                    }
                    Err(error) => Err(RejectReason::validation(error.to_string())),
                }
            }
            (OrderSide::Buy, _, _) => Ok(None),
            (OrderSide::Sell, _, _) => {
                match portfolio.reserve_shares(order.id(), order.symbol(), order.quantity()) {
                    Ok(event) => Ok(Some(event)),
                    Err(PortfolioError::InsufficientShares { .. }) => {
                        Err(RejectReason::insufficient_shares())
                    }
                    Err(error) => Err(RejectReason::validation(error.to_string())),
                }
            }
        }
    }
}
