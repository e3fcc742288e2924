//! Trading Bounded Context
//!
//! Order lifecycle, matching, and tape execution.

pub mod aggregate;
pub mod errors;
pub mod events;
pub mod repository;
pub mod services;
pub mod value_objects;

pub use aggregate::{Order, PlaceOrderCommand, ReconstitutedOrderParams};
pub use errors::TradingError;
pub use events::TradingEvent;
pub use repository::OrderRepository;
