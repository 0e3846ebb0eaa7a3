//! Market data client for candles and 24h tickers.

use std::time::Duration;

use anyhow::{Context, Result};
use futures::future::join_all;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::{pair_symbol, Candle, Interval, OhlcvSnapshot, Ticker};

use super::types::{parse_kline, TickerResponse};

pub const DEFAULT_FEED_URL: &str = "https://api.binance.com/api/v3";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Read-only client for a Binance-compatible REST feed.
///
/// Public methods never fail: any problem is logged and surfaces as `None`.
pub struct MarketClient {
    client: Client,
    base_url: String,
}

impl MarketClient {
    /// Create a client for `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Last two candles for `pair`, previous (completed) first.
    pub async fn ohlcv(&self, pair: &str, interval: Interval) -> Option<OhlcvSnapshot> {
        let Some(symbol) = pair_symbol(pair) else {
            warn!(pair = %pair, "Malformed pair");
            return None;
        };

        match self.fetch_klines(&symbol, interval, 2).await {
            Ok(candles) if candles.len() >= 2 => {
                let (previous, current) = (candles[candles.len() - 2], candles[candles.len() - 1]);
                Some(OhlcvSnapshot::from_candles(pair, interval, previous, current))
            }
            Ok(candles) => {
                warn!(pair = %pair, count = candles.len(), "Not enough candles");
                None
            }
            Err(e) => {
                warn!(pair = %pair, error = %e, "Failed to fetch candles");
                None
            }
        }
    }

    /// 24h ticker for `pair`.
    pub async fn ticker(&self, pair: &str) -> Option<Ticker> {
        let Some(symbol) = pair_symbol(pair) else {
            warn!(pair = %pair, "Malformed pair");
            return None;
        };

        match self.fetch_ticker(&symbol).await {
            Ok(response) => {
                let ticker = response.into_ticker(pair);
                if ticker.is_none() {
                    warn!(pair = %pair, "Ticker carried malformed numbers");
                }
                ticker
            }
            Err(e) => {
                warn!(pair = %pair, error = %e, "Failed to fetch ticker");
                None
            }
        }
    }

    /// Fetch several tickers concurrently; failures are dropped, order is kept.
    pub async fn tickers(&self, pairs: &[String]) -> Vec<Ticker> {
        join_all(pairs.iter().map(|pair| self.ticker(pair)))
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    async fn fetch_klines(&self, symbol: &str, interval: Interval, limit: u32) -> Result<Vec<Candle>> {
        let url = format!(
            "{}/klines?symbol={}&interval={}&limit={}",
            self.base_url,
            symbol,
            interval.as_str(),
            limit
        );

        debug!(url = %url, "Fetching klines");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch klines")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Klines request failed: {} - {}", status, body);
        }

        let rows: Vec<Vec<Value>> = response
            .json()
            .await
            .context("Failed to parse klines response")?;

        rows.iter()
            .map(|row| parse_kline(row).context("Malformed kline row"))
            .collect()
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<TickerResponse> {
        let url = format!("{}/ticker/24hr?symbol={}", self.base_url, symbol);

        debug!(url = %url, "Fetching ticker");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch ticker")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ticker request failed: {} - {}", status, body);
        }

        response
            .json()
            .await
            .context("Failed to parse ticker response")
    }
}
