//! Venue Engine Binary
//!
//! Starts the simulated trading venue with in-memory adapters.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin venue-engine
//! ```
//!
//! # Environment Variables
//!
//! All optional:
//! - `VENUE_QUOTE_POLL_MS`: Quote matching pass interval (default: 500)
//! - `VENUE_SWEEP_INTERVAL_SECS`: Expiry sweep interval (default: 30)
//! - `VENUE_MAX_FILL_PER_TICK`: Per-order fill cap per quote tick (default: 100)
//! - `VENUE_OUTBOX_BATCH_SIZE`: Outbox messages drained per tick (default: 100)
//! - `VENUE_OUTBOX_MAX_ATTEMPTS`: Attempts before a message is stuck (default: 10)
//! - `VENUE_OUTBOX_POLL_MS`: Outbox poll interval (default: 200)
//! - `VENUE_INBOX_POLL_MS`: Inbox poll interval (default: 200)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use venue_engine::application::ports::{PORTFOLIO_QUEUE, TRADING_QUEUE};
use venue_engine::application::services::{QuotePump, TapePump};
use venue_engine::application::use_cases::{
    MaintenanceSweepUseCase, QuotePassUseCase, TradePrintPassUseCase,
};
use venue_engine::domain::shared::Quantity;
use venue_engine::domain::trading::services::{MatchingEngine, MaxPerTickPolicy};
use venue_engine::execution::SymbolGate;
use venue_engine::infrastructure::bus::InMemoryBus;
use venue_engine::infrastructure::feeds::{ChannelTradeFeed, StaticQuoteFeed};
use venue_engine::infrastructure::persistence::{
    InMemoryInboxStore, InMemoryOrderStore, InMemoryPortfolioStore,
};
use venue_engine::infrastructure::settings::Settings;
use venue_engine::messaging::handlers::{PortfolioSettlementHandler, SettlementAuditHandler};
use venue_engine::messaging::inbox::{HandlerRegistry, InboxConsumer};
use venue_engine::messaging::outbox::OutboxPublisher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    tracing::info!("Starting Venue Engine");

    let settings = Settings::from_env();

    // Stores and transport.
    let order_store = Arc::new(InMemoryOrderStore::new());
    let portfolio_store = Arc::new(InMemoryPortfolioStore::new());
    let trading_inbox = Arc::new(InMemoryInboxStore::new());
    let portfolio_inbox = Arc::new(InMemoryInboxStore::new());
    let bus = Arc::new(InMemoryBus::new());

    // Market data.
    let quote_feed = Arc::new(StaticQuoteFeed::new());
    let trade_feed = Arc::new(ChannelTradeFeed::new(1024));

    let gate = Arc::new(SymbolGate::new());

    // Matching passes.
    let max_fill = Quantity::new(settings.engine.max_fill_per_tick);
    max_fill
        .validate_for_order()
        .context("VENUE_MAX_FILL_PER_TICK must be positive")?;
    let quote_pass = Arc::new(QuotePassUseCase::new(
        order_store.clone(),
        order_store.clone(),
        quote_feed.clone(),
        gate.clone(),
        MatchingEngine::new(MaxPerTickPolicy::new(max_fill)),
    ));
    let print_pass = Arc::new(TradePrintPassUseCase::new(
        order_store.clone(),
        order_store.clone(),
        gate.clone(),
    ));
    let sweep = MaintenanceSweepUseCase::new(order_store.clone(), order_store.clone(), gate);

    // Cross-context messaging: trading events settle portfolios, portfolio
    // confirmations flow back to the trading side for audit.
    let settlement = Arc::new(PortfolioSettlementHandler::new(
        portfolio_store.clone(),
        portfolio_store.clone(),
    ));
    let portfolio_registry = HandlerRegistry::new().with(settlement);
    let trading_registry = HandlerRegistry::new().with(Arc::new(SettlementAuditHandler));

    let shutdown = CancellationToken::new();
    let mut tasks: Vec<JoinHandle<()>> = Vec::new();

    tasks.push(tokio::spawn(
        OutboxPublisher::new(
            order_store.clone(),
            bus.clone(),
            PORTFOLIO_QUEUE,
            settings.outbox.clone(),
        )
        .run(shutdown.clone()),
    ));
    tasks.push(tokio::spawn(
        OutboxPublisher::new(
            portfolio_store,
            bus.clone(),
            TRADING_QUEUE,
            settings.outbox.clone(),
        )
        .run(shutdown.clone()),
    ));
    tasks.push(tokio::spawn(
        InboxConsumer::new(
            portfolio_inbox,
            bus.clone(),
            portfolio_registry,
            PORTFOLIO_QUEUE,
            settings.inbox.clone(),
        )
        .run(shutdown.clone()),
    ));
    tasks.push(tokio::spawn(
        InboxConsumer::new(
            trading_inbox,
            bus,
            trading_registry,
            TRADING_QUEUE,
            settings.inbox,
        )
        .run(shutdown.clone()),
    ));
    tasks.push(tokio::spawn(
        QuotePump::new(
            order_store.clone(),
            quote_pass,
            settings.engine.quote_poll_interval,
        )
        .run(shutdown.clone()),
    ));
    tasks.push(tokio::spawn(
        TapePump::new(trade_feed, print_pass).run(shutdown.clone()),
    ));
    tasks.push(tokio::spawn(sweep_loop(
        sweep,
        settings.engine.sweep_interval,
        shutdown.clone(),
    )));

    tracing::info!("Venue Engine running; press ctrl-c to stop");

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, draining workers");
    shutdown.cancel();

    for task in tasks {
        if let Err(error) = task.await {
            tracing::warn!(%error, "worker task did not shut down cleanly");
        }
    }

    tracing::info!("Venue Engine stopped");
    Ok(())
}

/// Initialize the tracing subscriber with environment filter.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("venue_engine=info")),
        )
        .init();
}

/// Periodically cancel expired orders until shutdown.
async fn sweep_loop(
    sweep: MaintenanceSweepUseCase,
    interval: std::time::Duration,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(interval) => {}
        }
        match sweep.execute().await {
            Ok(0) => {}
            Ok(count) => tracing::info!(count, "expired orders canceled"),
            Err(error) => tracing::error!(%error, "maintenance sweep failed"),
        }
    }
}

/// Wait for ctrl-c or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!(%error, "failed to install ctrl-c handler");
        }
    };

    #[cfg(unix)]
    {
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(error) => tracing::error!(%error, "failed to install SIGTERM handler"),
            }
        };
        tokio::select! {
            () = ctrl_c => {}
            () = terminate => {}
        }
    }

    #[cfg(not(unix))]
    ctrl_c.await;
}
