// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Venue Engine - Simulated Trading Venue Library
//!
//! A self-contained brokerage venue simulator: orders are matched against
//! live quotes and the public tape instead of a counterparty book, and
//! settlement flows to user portfolios through integration events.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Core business logic (aggregates, value objects, domain events)
//!   - `trading`: Order aggregate, status lifecycle, matching services
//!   - `portfolio`: Portfolio aggregate, reservations, fill settlement
//!   - `shared`: Identifiers, money, quantity, symbol, timestamps
//!
//! - **Application**: Use cases and orchestration
//!   - `ports`: Interfaces for external systems (`MessageBusPort`, feeds, units of work)
//!   - `use_cases`: `PlaceOrder`, `CancelOrder`, `QuotePass`, `TradePrintPass`,
//!     `MaintenanceSweep`, `ManageFunds`
//!   - `services`: Quote and tape pumps driving the matching passes
//!
//! - **Messaging**: Cross-context event plumbing
//!   - Transactional outbox, idempotent inbox, integration event mapper,
//!     settlement handlers
//!
//! - **Infrastructure**: Adapters (implementations)
//!   - `persistence`: In-memory stores with unit-of-work commits
//!   - `bus`: In-memory broker with ack/nack and dead-lettering
//!   - `feeds`: Quote table and tape channel adapters

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Execution coordination - per-symbol serialization.
pub mod execution;

/// Messaging layer - Outbox, inbox, and integration events.
pub mod messaging;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

pub use domain::portfolio::aggregate::Portfolio;
pub use domain::trading::{
    aggregate::{Order, PlaceOrderCommand},
    value_objects::{OrderSide, OrderStatus, OrderType, TimeInForce},
};
