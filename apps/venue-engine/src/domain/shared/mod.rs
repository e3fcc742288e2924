//! Shared Domain Types
//!
//! Value objects and errors shared across the Trading and Portfolio contexts.

pub mod errors;
pub mod value_objects;

pub use errors::DomainError;
pub use value_objects::{EventId, Money, OrderId, PortfolioId, Quantity, Symbol, Timestamp, UserId};
