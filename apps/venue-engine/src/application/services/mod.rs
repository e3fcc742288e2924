//! Application Services
//!
//! Long-running loops that drive the use cases from market data.

mod quote_pump;
mod tape_pump;

pub use quote_pump::QuotePump;
pub use tape_pump::TapePump;
