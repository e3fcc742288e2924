//! Application Layer
//!
//! Ports, use cases, and the services that drive them.

pub mod ports;
pub mod services;
pub mod use_cases;
