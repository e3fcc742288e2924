//! Engine Configuration Settings
//!
//! Configuration for the venue engine, loaded from environment variables.
//! Every setting has a default so the engine starts with no environment
//! at all.

use std::time::Duration;

use rust_decimal::Decimal;

use crate::messaging::inbox::InboxConfig;
use crate::messaging::outbox::OutboxConfig;

/// Matching pass settings.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Delay between quote-driven matching passes.
    pub quote_poll_interval: Duration,
    /// Delay between expiry sweeps.
    pub sweep_interval: Duration,
    /// Upper bound on a single order's fill per quote tick.
    pub max_fill_per_tick: Decimal,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            quote_poll_interval: Duration::from_millis(500),
            sweep_interval: Duration::from_secs(30),
            max_fill_per_tick: Decimal::new(100, 0),
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Matching pass settings.
    pub engine: EngineSettings,
    /// Outbox publisher settings, shared by both contexts.
    pub outbox: OutboxConfig,
    /// Inbox consumer settings, shared by both contexts.
    pub inbox: InboxConfig,
}

impl Settings {
    /// Load configuration from `VENUE_*` environment variables, falling
    /// back to defaults for anything unset or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        let engine = EngineSettings {
            quote_poll_interval: parse_env_duration_millis(
                "VENUE_QUOTE_POLL_MS",
                EngineSettings::default().quote_poll_interval,
            ),
            sweep_interval: parse_env_duration_secs(
                "VENUE_SWEEP_INTERVAL_SECS",
                EngineSettings::default().sweep_interval,
            ),
            max_fill_per_tick: parse_env_decimal(
                "VENUE_MAX_FILL_PER_TICK",
                EngineSettings::default().max_fill_per_tick,
            ),
        };

        let outbox = OutboxConfig {
            batch_size: parse_env_usize(
                "VENUE_OUTBOX_BATCH_SIZE",
                OutboxConfig::default().batch_size,
            ),
            max_attempts: parse_env_u32(
                "VENUE_OUTBOX_MAX_ATTEMPTS",
                OutboxConfig::default().max_attempts,
            ),
            poll_interval: parse_env_duration_millis(
                "VENUE_OUTBOX_POLL_MS",
                OutboxConfig::default().poll_interval,
            ),
            publish_timeout: parse_env_duration_secs(
                "VENUE_OUTBOX_PUBLISH_TIMEOUT_SECS",
                OutboxConfig::default().publish_timeout,
            ),
        };

        let inbox = InboxConfig {
            batch_size: parse_env_usize("VENUE_INBOX_BATCH_SIZE", InboxConfig::default().batch_size),
            poll_interval: parse_env_duration_millis(
                "VENUE_INBOX_POLL_MS",
                InboxConfig::default().poll_interval,
            ),
        };

        Self {
            engine,
            outbox,
            inbox,
        }
    }
}

fn parse_env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_decimal(key: &str, default: Decimal) -> Decimal {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_duration_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}

fn parse_env_duration_millis(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_millis)
}
