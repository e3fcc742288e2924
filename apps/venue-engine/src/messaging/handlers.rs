//! Consumer-side integration event handlers.
//!
//! The portfolio context settles fills and releases reservations in
//! response to trading events; the trading context records settlement
//! confirmations coming back. Both are registered explicitly with their
//! context's inbox consumer.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::from_value;
use tracing::info;

use crate::application::ports::PortfolioUnitOfWork;
use crate::domain::portfolio::{Portfolio, PortfolioError, PortfolioEvent, PortfolioRepository};
use crate::domain::shared::{Money, OrderId, Quantity, Symbol, UserId};
use crate::domain::trading::events::{
    OrderCanceled, OrderFilled, OrderPartiallyFilled, OrderRejected,
};
use crate::domain::trading::value_objects::OrderSide;

use super::inbox::{HandlerError, IntegrationEventHandler};
use super::integration_events::IntegrationEvent;
use super::mapper::IntegrationEventMapper;

/// Settles trading events against the owning user's portfolio.
///
/// Fill events (partial and final) settle through `apply_fill`; cancel and
/// reject events release whatever reservation is still outstanding for the
/// order's remainder.
pub struct PortfolioSettlementHandler {
    portfolios: Arc<dyn PortfolioRepository>,
    unit_of_work: Arc<dyn PortfolioUnitOfWork>,
}

impl PortfolioSettlementHandler {
    /// Create the handler.
    #[must_use]
    pub fn new(
        portfolios: Arc<dyn PortfolioRepository>,
        unit_of_work: Arc<dyn PortfolioUnitOfWork>,
    ) -> Self {
        Self {
            portfolios,
            unit_of_work,
        }
    }

    async fn load(&self, user_id: &UserId) -> Result<Portfolio, HandlerError> {
        self.portfolios
            .find_by_user(user_id)
            .await
            .map_err(|e| HandlerError::Failed(e.to_string()))?
            .ok_or_else(|| {
                HandlerError::Rejected(format!("no portfolio for user {user_id}"))
            })
    }

    async fn commit(
        &self,
        portfolio: &Portfolio,
        events: &[PortfolioEvent],
    ) -> Result<(), HandlerError> {
        let mapped = events
            .iter()
            .map(IntegrationEventMapper::from_portfolio)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| HandlerError::Failed(e.to_string()))?;
        self.unit_of_work
            .commit(portfolio, &mapped)
            .await
            .map_err(|e| HandlerError::Failed(e.to_string()))
    }

    async fn settle_fill(
        &self,
        payload: FillPayload,
    ) -> Result<(), HandlerError> {
        let mut portfolio = self.load(&payload.user_id).await?;
        let event = portfolio
            .apply_fill(
                &payload.order_id,
                payload.side,
                &payload.symbol,
                payload.quantity,
                payload.price,
                payload.limit_price,
            )
            .map_err(reject_on_business_rule)?;
        self.commit(&portfolio, &[event]).await
    }

    /// Release the reservation covering an order's unfilled remainder.
    /// Market buys carried no reservation; releases are bounded by what is
    /// actually reserved, so an over-estimate is harmless.
    async fn release_remainder(
        &self,
        payload: ReleasePayload,
    ) -> Result<(), HandlerError> {
        let mut portfolio = self.load(&payload.user_id).await?;

        let event = match payload.side {
            OrderSide::Buy => match payload.limit_price {
                Some(limit) => portfolio
                    .release_funds(
                        &payload.order_id,
                        (limit * payload.remaining_quantity.amount()).round_cash(),
                    )
                    .map_err(reject_on_business_rule)?,
                None => None,
            },
            OrderSide::Sell => portfolio
                .release_shares(&payload.order_id, &payload.symbol, payload.remaining_quantity)
                .map_err(reject_on_business_rule)?,
        };

        match event {
            Some(event) => self.commit(&portfolio, &[event]).await,
            None => Ok(()),
        }
    }
}

#[async_trait]
impl IntegrationEventHandler for PortfolioSettlementHandler {
    fn event_types(&self) -> &'static [&'static str] {
        &[
            "trading.order.accepted",
            "trading.order.partially_filled",
            "trading.order.filled",
            "trading.order.canceled",
            "trading.order.rejected",
        ]
    }

    async fn handle(&self, event: &IntegrationEvent) -> Result<(), HandlerError> {
        match event.event_type.as_str() {
            // Acceptance changes nothing portfolio-side; the reservation was
            // taken synchronously at placement.
            "trading.order.accepted" => {
                info!(subject = %event.subject, "order accepted, reservation already held");
                Ok(())
            }
            "trading.order.partially_filled" => {
                let e: OrderPartiallyFilled = parse(event)?;
                self.settle_fill(FillPayload {
                    user_id: e.user_id,
                    order_id: e.order_id,
                    symbol: e.symbol,
                    side: e.side,
                    quantity: e.fill_quantity,
                    price: e.fill_price,
                    limit_price: e.limit_price,
                })
                .await
            }
            "trading.order.filled" => {
                let e: OrderFilled = parse(event)?;
                self.settle_fill(FillPayload {
                    user_id: e.user_id,
                    order_id: e.order_id,
                    symbol: e.symbol,
                    side: e.side,
                    quantity: e.fill_quantity,
                    price: e.fill_price,
                    limit_price: e.limit_price,
                })
                .await
            }
            "trading.order.canceled" => {
                let e: OrderCanceled = parse(event)?;
                self.release_remainder(ReleasePayload {
                    user_id: e.user_id,
                    order_id: e.order_id,
                    symbol: e.symbol,
                    side: e.side,
                    remaining_quantity: e.remaining_quantity,
                    limit_price: e.limit_price,
                })
                .await
            }
            "trading.order.rejected" => {
                let e: OrderRejected = parse(event)?;
                self.release_remainder(ReleasePayload {
                    user_id: e.user_id,
                    order_id: e.order_id,
                    symbol: e.symbol,
                    side: e.side,
                    remaining_quantity: e.remaining_quantity,
                    limit_price: e.limit_price,
                })
                .await
            }
            other => Err(HandlerError::Rejected(format!(
                "unexpected event type {other}"
            ))),
        }
    }
}

struct FillPayload {
    user_id: UserId,
    order_id: OrderId,
    symbol: Symbol,
    side: OrderSide,
    quantity: Quantity,
    price: Money,
    limit_price: Option<Money>,
}

struct ReleasePayload {
    user_id: UserId,
    order_id: OrderId,
    symbol: Symbol,
    side: OrderSide,
    remaining_quantity: Quantity,
    limit_price: Option<Money>,
}

fn parse<T: serde::de::DeserializeOwned>(event: &IntegrationEvent) -> Result<T, HandlerError> {
    from_value(event.data.clone())
        .map_err(|e| HandlerError::Rejected(format!("malformed payload: {e}")))
}

fn reject_on_business_rule(error: PortfolioError) -> HandlerError {
    HandlerError::Rejected(error.to_string())
}

/// Records settlement confirmations flowing back to the trading context.
///
/// Settlement does not change order state, so this handler only logs; it
/// exists so the trading inbox drains its queue instead of dead-lettering
/// portfolio events.
pub struct SettlementAuditHandler;

#[async_trait]
impl IntegrationEventHandler for SettlementAuditHandler {
    fn event_types(&self) -> &'static [&'static str] {
        &[
            "portfolio.funds.deposited",
            "portfolio.funds.withdrawn",
            "portfolio.funds.reserved",
            "portfolio.reservation.released",
            "portfolio.shares.reserved",
            "portfolio.shares.released",
            "portfolio.fill.applied",
        ]
    }

    async fn handle(&self, event: &IntegrationEvent) -> Result<(), HandlerError> {
        info!(
            event_type = %event.event_type,
            subject = %event.subject,
            "settlement confirmation received"
        );
        Ok(())
    }
}
