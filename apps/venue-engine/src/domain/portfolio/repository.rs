//! Portfolio Repository Trait
//!
//! Persistence abstraction for portfolios, implemented by infrastructure
//! adapters.

use async_trait::async_trait;

use super::aggregate::Portfolio;
use super::errors::PortfolioError;
use crate::domain::shared::UserId;

/// Repository trait for Portfolio persistence.
#[async_trait]
pub trait PortfolioRepository: Send + Sync {
    /// Save a portfolio (insert or update).
    ///
    /// # Errors
    ///
    /// Returns error if persistence fails.
    async fn save(&self, portfolio: &Portfolio) -> Result<(), PortfolioError>;

    /// Find a user's portfolio.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<Portfolio>, PortfolioError>;
}
