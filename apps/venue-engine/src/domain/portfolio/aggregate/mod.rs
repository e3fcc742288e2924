//! Portfolio aggregate root and its positions.

mod portfolio;
mod position;

pub use portfolio::{Portfolio, ReconstitutedPortfolioParams};
pub use position::Position;
