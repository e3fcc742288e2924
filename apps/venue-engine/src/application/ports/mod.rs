//! Application Ports
//!
//! Interfaces the use cases depend on, implemented by infrastructure
//! adapters.

mod bus_port;
mod feeds;
mod unit_of_work;

pub use bus_port::{Delivery, MessageBusPort, PORTFOLIO_QUEUE, TRADING_QUEUE};
pub use feeds::{FeedError, QuoteFeedPort, TradeFeedPort};
pub use unit_of_work::{PortfolioUnitOfWork, TradingUnitOfWork};
