//! Order aggregate root.

mod order;

pub use order::{Order, PlaceOrderCommand, ReconstitutedOrderParams};
