//! Market data feed adapters.

pub mod in_memory;

pub use in_memory::{ChannelTradeFeed, StaticQuoteFeed};
