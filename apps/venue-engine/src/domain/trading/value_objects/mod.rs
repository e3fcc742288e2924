//! Value objects for the Trading context.

mod market_data;
mod order_side;
mod order_status;
mod order_type;
mod reasons;
mod time_in_force;

pub use market_data::{ProposedFill, QuoteSnapshot, TradePrint};
pub use order_side::OrderSide;
pub use order_status::OrderStatus;
pub use order_type::OrderType;
pub use reasons::{CancelReason, RejectReason};
pub use time_in_force::TimeInForce;
