//! Infrastructure Layer
//!
//! Adapters for persistence, messaging transport, market data feeds, and
//! configuration. Everything here implements a port defined by the
//! application or messaging layers.

pub mod bus;
pub mod feeds;
pub mod persistence;
pub mod settings;
