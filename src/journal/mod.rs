//! Trade journal: per-user trade records, lifecycle operations, statistics and CSV.

mod csv_io;
#[cfg(test)]
mod memory;
mod service;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Trade, TradeOutcome, TradeStatus};

#[cfg(test)]
pub use csv_io::CSV_HEADER;
#[cfg(test)]
pub use memory::InMemoryTradeStore;
pub use service::TradeJournal;

/// In-place edit run inside a store's read-modify-write.
///
/// Returns `false` to abandon the edit and leave the stored record untouched.
pub type TradeEdit = Box<dyn FnOnce(&mut Trade) -> bool + Send>;

/// Storage for journal trades, partitioned by owner.
///
/// Every method takes the owning user id, and implementations filter on it in
/// the lookup itself, so a caller can never see or touch another user's trade.
#[async_trait]
pub trait TradeRepository: Send + Sync {
    /// All trades of `user_id` in insertion order.
    async fn list(&self, user_id: &str) -> Result<Vec<Trade>>;

    async fn get(&self, user_id: &str, trade_id: &str) -> Result<Option<Trade>>;

    /// Store a new trade under `trade.user_id`.
    async fn insert(&self, trade: &Trade) -> Result<()>;

    /// Store a batch of new trades. Either every trade is stored or none is.
    async fn insert_all(&self, trades: &[Trade]) -> Result<()>;

    /// Returns whether a trade was removed.
    async fn remove(&self, user_id: &str, trade_id: &str) -> Result<bool>;

    /// Atomically load, edit and persist one trade.
    ///
    /// `None` when the trade is absent or the edit declined.
    async fn modify(&self, user_id: &str, trade_id: &str, edit: TradeEdit) -> Result<Option<Trade>>;
}

/// Journal list views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TradeFilter {
    #[default]
    All,
    Open,
    Closed,
    Wins,
    Losses,
}

impl TradeFilter {
    pub fn matches(&self, trade: &Trade) -> bool {
        match self {
            TradeFilter::All => true,
            TradeFilter::Open => trade.status == TradeStatus::Open,
            TradeFilter::Closed => trade.status == TradeStatus::Closed,
            TradeFilter::Wins => trade.outcome == TradeOutcome::Win,
            TradeFilter::Losses => trade.outcome == TradeOutcome::Loss,
        }
    }
}
