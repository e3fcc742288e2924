//! Tape pump service.
//!
//! Subscribes to the trade feed, running a tape pass for every print.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::application::ports::TradeFeedPort;
use crate::application::use_cases::TradePrintPassUseCase;

/// Drives tape-driven execution off the trade feed.
pub struct TapePump {
    feed: Arc<dyn TradeFeedPort>,
    print_pass: Arc<TradePrintPassUseCase>,
}

impl TapePump {
    /// Create the pump.
    #[must_use]
    pub fn new(feed: Arc<dyn TradeFeedPort>, print_pass: Arc<TradePrintPassUseCase>) -> Self {
        Self { feed, print_pass }
    }

    /// Run until cancelled or the feed closes. Per-print failures are
    /// logged and the stream continues.
    pub async fn run(self, cancel: CancellationToken) {
        let mut prints = match self.feed.subscribe().await {
            Ok(receiver) => receiver,
            Err(error) => {
                error!(%error, "could not subscribe to the trade feed");
                return;
            }
        };
        info!("tape pump started");

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                print = prints.recv() => {
                    let Some(print) = print else {
                        warn!("trade feed closed, stopping tape pump");
                        break;
                    };
                    if let Err(error) = self.print_pass.execute(&print).await {
                        error!(symbol = %print.symbol, %error, "tape pass failed");
                    }
                }
            }
        }
        info!("tape pump stopped");
    }
}
