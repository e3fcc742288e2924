//! Quote pump service.
//!
//! Periodically runs a quote pass for every symbol that currently has
//! open orders. Per-symbol failures are logged and do not stop the pump.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::application::use_cases::QuotePassUseCase;
use crate::domain::trading::services::FillPolicy;
use crate::domain::trading::OrderRepository;

/// Drives quote-driven execution on an interval.
pub struct QuotePump<P: FillPolicy> {
    orders: Arc<dyn OrderRepository>,
    quote_pass: Arc<QuotePassUseCase<P>>,
    interval: Duration,
}

impl<P: FillPolicy> QuotePump<P> {
    /// Create the pump.
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        quote_pass: Arc<QuotePassUseCase<P>>,
        interval: Duration,
    ) -> Self {
        Self {
            orders,
            quote_pass,
            interval,
        }
    }

    /// Run until cancelled.
    pub async fn run(self, cancel: CancellationToken) {
        info!(interval_ms = self.interval.as_millis() as u64, "quote pump started");
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(self.interval) => {}
            }
            self.tick().await;
        }
        info!("quote pump stopped");
    }

    /// Run one pass for every symbol with open interest.
    pub async fn tick(&self) {
        let symbols: BTreeSet<_> = match self.orders.find_open().await {
            Ok(orders) => orders.into_iter().map(|o| o.symbol().clone()).collect(),
            Err(error) => {
                error!(%error, "quote pump could not list open orders");
                return;
            }
        };

        for symbol in symbols {
            if let Err(error) = self.quote_pass.execute(&symbol).await {
                error!(symbol = %symbol, %error, "quote pass failed");
            }
        }
    }
}
