//! Execution-layer concurrency primitives.

mod symbol_gate;

pub use symbol_gate::SymbolGate;
