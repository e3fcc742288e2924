//! Portfolio Bounded Context
//!
//! Per-user cash, positions, and the reservations taken against open
//! orders.

pub mod aggregate;
pub mod errors;
pub mod events;
pub mod repository;

pub use aggregate::{Portfolio, Position, ReconstitutedPortfolioParams};
pub use errors::PortfolioError;
pub use events::PortfolioEvent;
pub use repository::PortfolioRepository;
