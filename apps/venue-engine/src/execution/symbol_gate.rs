//! Per-symbol execution serialization.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::shared::Symbol;

/// Serializes execution passes per symbol.
///
/// Each symbol gets one lazily-created permit, case-insensitively keyed and
/// never removed. An execution pass acquires the permit before touching the
/// symbol's orders and holds it for the whole pass; the guard releases on
/// drop, including error paths. Distinct symbols never block each other.
#[derive(Debug, Default)]
pub struct SymbolGate {
    permits: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SymbolGate {
    /// Create an empty gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the permit for a symbol, waiting if another pass holds it.
    pub async fn acquire(&self, symbol: &Symbol) -> OwnedMutexGuard<()> {
        let permit = {
            let mut permits = self.permits.lock().await;
            permits
                .entry(symbol.as_str().to_ascii_uppercase())
                .or_default()
                .clone()
        };
        permit.lock_owned().await
    }
}
