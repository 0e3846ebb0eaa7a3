//! In-process trade store for tests.

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::models::Trade;
use super::{TradeEdit, TradeRepository};

/// Trade store backed by a vector behind a mutex.
///
/// The lock is held for the whole of [`modify`](TradeRepository::modify), so
/// read-modify-writes cannot interleave.
#[derive(Debug, Default)]
pub struct InMemoryTradeStore {
    trades: Mutex<Vec<Trade>>,
}

impl InMemoryTradeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.trades.lock().await.len()
    }
}

#[async_trait]
impl TradeRepository for InMemoryTradeStore {
    async fn list(&self, user_id: &str) -> Result<Vec<Trade>> {
        let trades = self.trades.lock().await;
        Ok(trades.iter().filter(|t| t.user_id == user_id).cloned().collect())
    }

    async fn get(&self, user_id: &str, trade_id: &str) -> Result<Option<Trade>> {
        let trades = self.trades.lock().await;
        Ok(trades
            .iter()
            .find(|t| t.user_id == user_id && t.id == trade_id)
            .cloned())
    }

    async fn insert(&self, trade: &Trade) -> Result<()> {
        let mut trades = self.trades.lock().await;
        if trades.iter().any(|t| t.id == trade.id) {
            bail!("Trade {} already exists", trade.id);
        }
        trades.push(trade.clone());
        Ok(())
    }

    async fn insert_all(&self, batch: &[Trade]) -> Result<()> {
        let mut trades = self.trades.lock().await;
        for (i, trade) in batch.iter().enumerate() {
            if trades.iter().chain(&batch[..i]).any(|t| t.id == trade.id) {
                bail!("Trade {} already exists", trade.id);
            }
        }
        trades.extend_from_slice(batch);
        Ok(())
    }

    async fn remove(&self, user_id: &str, trade_id: &str) -> Result<bool> {
        let mut trades = self.trades.lock().await;
        let before = trades.len();
        trades.retain(|t| !(t.user_id == user_id && t.id == trade_id));
        Ok(trades.len() != before)
    }

    async fn modify(&self, user_id: &str, trade_id: &str, edit: TradeEdit) -> Result<Option<Trade>> {
        let mut trades = self.trades.lock().await;
        let Some(slot) = trades
            .iter_mut()
            .find(|t| t.user_id == user_id && t.id == trade_id)
        else {
            return Ok(None);
        };

        let mut draft = slot.clone();
        if !edit(&mut draft) {
            return Ok(None);
        }

        // Ownership is not editable
        draft.user_id = user_id.to_string();
        draft.id = trade_id.to_string();
        *slot = draft.clone();
        Ok(Some(draft))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, QuantityType, TradeOutcome, TradeStatus};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn trade(id: &str, user: &str) -> Trade {
        let now = Utc::now();
        Trade {
            id: id.to_string(),
            user_id: user.to_string(),
            pair: "BTC/USDT".to_string(),
            direction: Direction::Long,
            entry_price: dec!(60000),
            exit_price: None,
            quantity: dec!(0.1),
            quantity_type: QuantityType::Base,
            entry_date: now,
            exit_date: None,
            stop_loss: None,
            take_profit: None,
            leverage: 1,
            exchange: "binance".to_string(),
            status: TradeStatus::Open,
            outcome: TradeOutcome::Pending,
            profit_loss: Decimal::ZERO,
            profit_loss_percent: Decimal::ZERO,
            fees: Decimal::ZERO,
            notes: String::new(),
            tags: vec![],
            screenshots: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let store = InMemoryTradeStore::new();
        store.insert(&trade("a", "alice@example.com")).await.unwrap();
        store.insert(&trade("b", "bob@example.com")).await.unwrap();

        assert_eq!(store.list("alice@example.com").await.unwrap().len(), 1);
        assert!(store.get("bob@example.com", "a").await.unwrap().is_none());
        assert!(!store.remove("bob@example.com", "a").await.unwrap());
        assert!(store
            .modify("bob@example.com", "a", Box::new(|_: &mut Trade| true))
            .await
            .unwrap()
            .is_none());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_declined_edit_leaves_record() {
        let store = InMemoryTradeStore::new();
        store.insert(&trade("a", "alice@example.com")).await.unwrap();

        let result = store
            .modify(
                "alice@example.com",
                "a",
                Box::new(|t: &mut Trade| {
                    t.notes = "scratch".to_string();
                    false
                }),
            )
            .await
            .unwrap();

        assert!(result.is_none());
        let stored = store.get("alice@example.com", "a").await.unwrap().unwrap();
        assert_eq!(stored.notes, "");
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let store = InMemoryTradeStore::new();
        store.insert(&trade("a", "alice@example.com")).await.unwrap();
        assert!(store.insert(&trade("a", "alice@example.com")).await.is_err());
    }

    #[tokio::test]
    async fn test_batch_with_duplicate_stores_nothing() {
        let store = InMemoryTradeStore::new();
        store.insert(&trade("a", "alice@example.com")).await.unwrap();

        let batch = vec![trade("b", "alice@example.com"), trade("a", "alice@example.com")];
        assert!(store.insert_all(&batch).await.is_err());
        assert_eq!(store.len().await, 1);

        let batch = vec![trade("c", "alice@example.com"), trade("c", "alice@example.com")];
        assert!(store.insert_all(&batch).await.is_err());

        let batch = vec![trade("b", "alice@example.com"), trade("c", "alice@example.com")];
        store.insert_all(&batch).await.unwrap();
        assert_eq!(store.len().await, 3);
    }
}
