//! Market data feed: REST client for candles and tickers, plus a polling watcher.

mod market_client;
mod types;
mod watcher;

pub use market_client::{MarketClient, DEFAULT_FEED_URL, DEFAULT_TIMEOUT};
pub use watcher::{FeedState, PriceWatcher, DEFAULT_POLL_INTERVAL};
