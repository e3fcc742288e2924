//! Domain Layer
//!
//! Bounded contexts and shared value objects. No I/O lives here.

pub mod portfolio;
pub mod shared;
pub mod trading;
