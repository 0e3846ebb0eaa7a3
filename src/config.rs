//! Application settings from the environment (after `.env` is loaded).

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::{DEFAULT_FEED_URL, DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT};
use crate::exchange::DEFAULT_EXCHANGE;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:./tradedesk.db?mode=rwc";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub feed_url: String,
    pub feed_timeout_secs: u64,
    pub poll_interval_secs: u64,
    pub default_exchange: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            feed_url: DEFAULT_FEED_URL.to_string(),
            feed_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
            default_exchange: DEFAULT_EXCHANGE.to_string(),
        }
    }
}

impl AppConfig {
    /// Read `TRADEDESK_*` variables from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("TRADEDESK_DATABASE_URL") {
            config.database_url = url;
        }
        if let Some(url) = lookup("TRADEDESK_FEED_URL") {
            config.feed_url = url;
        }
        if let Some(secs) = lookup("TRADEDESK_FEED_TIMEOUT_SECS") {
            config.feed_timeout_secs = parse_secs("TRADEDESK_FEED_TIMEOUT_SECS", &secs)?;
        }
        if let Some(secs) = lookup("TRADEDESK_POLL_INTERVAL_SECS") {
            config.poll_interval_secs = parse_secs("TRADEDESK_POLL_INTERVAL_SECS", &secs)?;
        }
        if let Some(exchange) = lookup("TRADEDESK_DEFAULT_EXCHANGE") {
            config.default_exchange = exchange.trim().to_lowercase();
        }

        Ok(config)
    }

    pub fn feed_timeout(&self) -> Duration {
        Duration::from_secs(self.feed_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64> {
    let secs: u64 = value
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a whole number of seconds, got '{value}'"))?;
    anyhow::ensure!(secs > 0, "{key} must be positive");
    Ok(secs)
}
