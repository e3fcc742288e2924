//! Portfolio funding use case.

use std::sync::Arc;

use tracing::info;

use crate::application::ports::PortfolioUnitOfWork;
use crate::domain::portfolio::{Portfolio, PortfolioRepository};
use crate::domain::shared::{Money, UserId};
use crate::messaging::IntegrationEventMapper;

use super::UseCaseError;

/// Deposits and withdrawals.
pub struct ManageFundsUseCase {
    portfolios: Arc<dyn PortfolioRepository>,
    portfolio_uow: Arc<dyn PortfolioUnitOfWork>,
}

impl ManageFundsUseCase {
    /// Create the use case.
    #[must_use]
    pub fn new(
        portfolios: Arc<dyn PortfolioRepository>,
        portfolio_uow: Arc<dyn PortfolioUnitOfWork>,
    ) -> Self {
        Self {
            portfolios,
            portfolio_uow,
        }
    }

    /// Deposit cash into a user's portfolio, creating it on first use.
    /// Returns the new cash balance.
    ///
    /// # Errors
    ///
    /// Returns error if the amount is invalid or the commit fails.
    pub async fn deposit(&self, user_id: &UserId, amount: Money) -> Result<Money, UseCaseError> {
        let mut portfolio = self
            .portfolios
            .find_by_user(user_id)
            .await?
            .unwrap_or_else(|| Portfolio::new(user_id.clone()));

        let event = portfolio.deposit(amount)?;
        let mapped = IntegrationEventMapper::from_portfolio(&event)?;
        self.portfolio_uow.commit(&portfolio, &[mapped]).await?;

        info!(user_id = %user_id, amount = %amount, "funds deposited");
        Ok(portfolio.cash())
    }

    /// Withdraw available cash from a user's portfolio. Returns the new
    /// cash balance.
    ///
    /// # Errors
    ///
    /// Returns error if the portfolio is missing, the amount exceeds
    /// available cash, or the commit fails.
    pub async fn withdraw(&self, user_id: &UserId, amount: Money) -> Result<Money, UseCaseError> {
        let mut portfolio = self
            .portfolios
            .find_by_user(user_id)
            .await?
            .ok_or_else(|| crate::domain::portfolio::PortfolioError::NotFound {
                user_id: user_id.to_string(),
            })?;

        let event = portfolio.withdraw(amount)?;
        let mapped = IntegrationEventMapper::from_portfolio(&event)?;
        self.portfolio_uow.commit(&portfolio, &[mapped]).await?;

        info!(user_id = %user_id, amount = %amount, "funds withdrawn");
        Ok(portfolio.cash())
    }
}
