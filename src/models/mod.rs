//! Data models for journal trades, statistics, and market data.

mod candle;
mod stats;
mod trade;

pub use candle::{pair_symbol, Candle, Interval, OhlcvSnapshot, Ticker};
pub use stats::TradeStats;
#[cfg(test)]
pub use stats::NOT_AVAILABLE;
pub use trade::{
    parse_tags, Direction, NewTrade, QuantityType, Trade, TradeOutcome, TradePatch, TradeStatus,
};
