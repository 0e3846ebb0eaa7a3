//! Wire types for the Binance-compatible market data API.

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

use crate::models::{Candle, Ticker};

/// 24h ticker from `/ticker/24hr`. Numbers arrive as strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerResponse {
    pub last_price: String,
    pub price_change: String,
    pub price_change_percent: String,
    pub high_price: String,
    pub low_price: String,
    pub volume: String,
}

impl TickerResponse {
    /// Convert to a [`Ticker`] labelled with the requested pair. `None` if any number is malformed.
    pub fn into_ticker(self, pair: &str) -> Option<Ticker> {
        Some(Ticker {
            symbol: pair.to_string(),
            price: self.last_price.parse().ok()?,
            price_change: self.price_change.parse().ok()?,
            price_change_percent: self.price_change_percent.parse().ok()?,
            high_24h: self.high_price.parse().ok()?,
            low_24h: self.low_price.parse().ok()?,
            volume_24h: self.volume.parse().ok()?,
            fetched_at: Utc::now(),
        })
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Parse one kline row:
/// `[openTime, open, high, low, close, volume, closeTime, quoteVolume, trades, takerBuyBase, takerBuyQuote, ...]`.
pub fn parse_kline(row: &[Value]) -> Option<Candle> {
    if row.len() < 11 {
        return None;
    }
    Some(Candle {
        open_time: integer(&row[0])?,
        open: number(&row[1])?,
        high: number(&row[2])?,
        low: number(&row[3])?,
        close: number(&row[4])?,
        volume: number(&row[5])?,
        close_time: integer(&row[6])?,
        quote_volume: number(&row[7])?,
        trades: u64::try_from(integer(&row[8])?).ok()?,
        taker_buy_base_volume: number(&row[9])?,
        taker_buy_quote_volume: number(&row[10])?,
    })
}
