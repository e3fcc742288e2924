//! Order Repository Trait
//!
//! Defines the persistence abstraction for orders.
//! Implemented by adapters in the infrastructure layer.

use async_trait::async_trait;

use super::aggregate::Order;
use super::errors::TradingError;
use crate::domain::shared::{OrderId, Symbol};

/// Repository trait for Order persistence.
///
/// This is a domain interface (port) that is implemented by
/// infrastructure adapters (in-memory for now).
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Save an order (insert or update).
    ///
    /// # Errors
    ///
    /// Returns error if persistence fails.
    async fn save(&self, order: &Order) -> Result<(), TradingError>;

    /// Find an order by its ID.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, TradingError>;

    /// Find all open (fillable) orders for a symbol.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn find_open_by_symbol(&self, symbol: &Symbol) -> Result<Vec<Order>, TradingError>;

    /// Find all open (fillable) orders across symbols.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn find_open(&self) -> Result<Vec<Order>, TradingError>;
}
