//! Trading domain services.
//!
//! Pure execution logic: the resting order book, quote-driven matching, and
//! tape-driven execution. None of these perform I/O; use cases orchestrate
//! them under the per-symbol gate.

mod matching_engine;
mod order_book;
mod tape_executor;

pub use matching_engine::{FillPolicy, MatchingEngine, MaxPerTickPolicy};
pub use order_book::{BookEntry, OrderBook, ProposedTrade};
pub use tape_executor::{TapeExecution, TradePrintExecutor};
