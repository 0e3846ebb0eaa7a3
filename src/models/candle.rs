//! Market data shapes: candles, two-candle snapshots and 24h tickers.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Candle width accepted by the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum Interval {
    #[serde(rename = "1m")]
    #[value(name = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    #[value(name = "5m")]
    FiveMinutes,
    #[default]
    #[serde(rename = "15m")]
    #[value(name = "15m")]
    FifteenMinutes,
    #[serde(rename = "1h")]
    #[value(name = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    #[value(name = "4h")]
    FourHours,
    #[serde(rename = "1d")]
    #[value(name = "1d")]
    OneDay,
}

impl Interval {
    pub const ALL: [Interval; 6] = [
        Interval::OneMinute,
        Interval::FiveMinutes,
        Interval::FifteenMinutes,
        Interval::OneHour,
        Interval::FourHours,
        Interval::OneDay,
    ];

    /// Wire code used by the kline endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
            Interval::OneHour => "1h",
            Interval::FourHours => "4h",
            Interval::OneDay => "1d",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1 Minute",
            Interval::FiveMinutes => "5 Minutes",
            Interval::FifteenMinutes => "15 Minutes",
            Interval::OneHour => "1 Hour",
            Interval::FourHours => "4 Hours",
            Interval::OneDay => "1 Day",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Interval::ALL
            .into_iter()
            .find(|i| i.as_str() == s.trim())
            .ok_or_else(|| format!("unsupported interval: {s}"))
    }
}

/// Map `BASE/QUOTE` to the venue symbol (`BTC/USDT` -> `BTCUSDT`).
///
/// Returns `None` for anything that is not exactly two non-empty alphanumeric legs.
pub fn pair_symbol(pair: &str) -> Option<String> {
    let (base, quote) = pair.trim().split_once('/')?;
    let valid = |leg: &str| !leg.is_empty() && leg.chars().all(|c| c.is_ascii_alphanumeric());
    if !valid(base) || !valid(quote) {
        return None;
    }
    Some(format!("{}{}", base, quote).to_uppercase())
}

/// One OHLCV bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Open time, epoch milliseconds
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Close time, epoch milliseconds
    pub close_time: i64,
    pub quote_volume: f64,
    pub trades: u64,
    pub taker_buy_base_volume: f64,
    pub taker_buy_quote_volume: f64,
}

impl Candle {
    /// Bare OHLC bar with zeroed timing and trade fields.
    #[cfg(test)]
    pub fn from_ohlc(open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            open_time: 0,
            open,
            high,
            low,
            close,
            volume,
            close_time: 0,
            quote_volume: 0.0,
            trades: 0,
            taker_buy_base_volume: 0.0,
            taker_buy_quote_volume: 0.0,
        }
    }

    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn upper_wick(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    pub fn lower_wick(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    /// Body as a percentage of range; 0 for a zero-range bar.
    pub fn body_percent(&self) -> f64 {
        percent_of_range(self.body(), self.range())
    }

    pub fn upper_wick_percent(&self) -> f64 {
        percent_of_range(self.upper_wick(), self.range())
    }

    pub fn lower_wick_percent(&self) -> f64 {
        percent_of_range(self.lower_wick(), self.range())
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }
}

fn percent_of_range(part: f64, range: f64) -> f64 {
    if range > 0.0 {
        part / range * 100.0
    } else {
        0.0
    }
}

/// Two-candle extremes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HighLow {
    pub high: f64,
    pub low: f64,
    pub range: f64,
}

/// Current (in-progress) and previous (completed) candle with derived changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvSnapshot {
    /// Pair as requested (`BTC/USDT`)
    pub symbol: String,
    pub interval: Interval,
    pub current: Candle,
    pub previous: Candle,
    pub price_change: f64,
    pub price_change_percent: f64,
    pub volume_change: f64,
    /// 0 when the previous volume is 0
    pub volume_change_percent: f64,
    pub high_low: HighLow,
}

impl OhlcvSnapshot {
    pub fn from_candles(symbol: &str, interval: Interval, previous: Candle, current: Candle) -> Self {
        let price_change = current.close - previous.close;
        let price_change_percent = if previous.close != 0.0 {
            price_change / previous.close * 100.0
        } else {
            0.0
        };
        let volume_change = current.volume - previous.volume;
        let volume_change_percent = if previous.volume > 0.0 {
            volume_change / previous.volume * 100.0
        } else {
            0.0
        };

        let high = previous.high.max(current.high);
        let low = previous.low.min(current.low);

        Self {
            symbol: symbol.to_string(),
            interval,
            current,
            previous,
            price_change,
            price_change_percent,
            volume_change,
            volume_change_percent,
            high_low: HighLow {
                high,
                low,
                range: high - low,
            },
        }
    }
}

/// 24h rolling ticker for a pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    pub price: f64,
    pub price_change: f64,
    pub price_change_percent: f64,
    pub high_24h: f64,
    pub low_24h: f64,
    pub volume_24h: f64,
    pub fetched_at: DateTime<Utc>,
}
