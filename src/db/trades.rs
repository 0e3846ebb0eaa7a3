//! SQLite-backed [`TradeRepository`].

use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};

use crate::journal::{TradeEdit, TradeRepository};
use crate::models::{Direction, QuantityType, Trade, TradeOutcome, TradeStatus};

/// Stored trade row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredTrade {
    pub id: String,
    pub user_id: String,
    pub pair: String,
    pub direction: String,
    pub entry_price: String,
    pub exit_price: Option<String>,
    pub quantity: String,
    pub quantity_type: String,
    pub entry_date: String,
    pub exit_date: Option<String>,
    pub stop_loss: Option<String>,
    pub take_profit: Option<String>,
    pub leverage: i64,
    pub exchange: String,
    pub status: String,
    pub outcome: String,
    pub profit_loss: String,
    pub profit_loss_percent: String,
    pub fees: String,
    pub notes: String,
    pub tags: String,
    pub screenshots: String,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<StoredTrade> for Trade {
    type Error = anyhow::Error;

    fn try_from(row: StoredTrade) -> Result<Self> {
        let context = |field: &str| format!("Corrupt {} on trade {}", field, row.id);

        Ok(Trade {
            direction: Direction::from_str(&row.direction).map_err(|e| anyhow!(e))?,
            entry_price: decimal(&row.entry_price).with_context(|| context("entry_price"))?,
            exit_price: optional_decimal(&row.exit_price).with_context(|| context("exit_price"))?,
            quantity: decimal(&row.quantity).with_context(|| context("quantity"))?,
            quantity_type: QuantityType::from_str(&row.quantity_type).map_err(|e| anyhow!(e))?,
            entry_date: timestamp(&row.entry_date).with_context(|| context("entry_date"))?,
            exit_date: row
                .exit_date
                .as_deref()
                .map(timestamp)
                .transpose()
                .with_context(|| context("exit_date"))?,
            stop_loss: optional_decimal(&row.stop_loss).with_context(|| context("stop_loss"))?,
            take_profit: optional_decimal(&row.take_profit).with_context(|| context("take_profit"))?,
            leverage: u32::try_from(row.leverage).with_context(|| context("leverage"))?,
            status: TradeStatus::from_str(&row.status).map_err(|e| anyhow!(e))?,
            outcome: TradeOutcome::from_str(&row.outcome).map_err(|e| anyhow!(e))?,
            profit_loss: decimal(&row.profit_loss).with_context(|| context("profit_loss"))?,
            profit_loss_percent: decimal(&row.profit_loss_percent)
                .with_context(|| context("profit_loss_percent"))?,
            fees: decimal(&row.fees).with_context(|| context("fees"))?,
            tags: serde_json::from_str(&row.tags).with_context(|| context("tags"))?,
            screenshots: serde_json::from_str(&row.screenshots)
                .with_context(|| context("screenshots"))?,
            created_at: timestamp(&row.created_at).with_context(|| context("created_at"))?,
            updated_at: timestamp(&row.updated_at).with_context(|| context("updated_at"))?,
            id: row.id,
            user_id: row.user_id,
            pair: row.pair,
            exchange: row.exchange,
            notes: row.notes,
        })
    }
}

fn decimal(raw: &str) -> Result<Decimal> {
    Ok(Decimal::from_str(raw)?)
}

fn optional_decimal(raw: &Option<String>) -> Result<Option<Decimal>> {
    raw.as_deref().map(decimal).transpose()
}

fn timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

fn text(value: Option<Decimal>) -> Option<String> {
    value.map(|v| v.to_string())
}

/// Journal trades in the `trades` table.
///
/// Every query filters on `user_id`; read-modify-writes run in a transaction.
#[derive(Clone)]
pub struct SqliteTradeStore {
    pool: SqlitePool,
}

impl SqliteTradeStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_one(conn: &mut SqliteConnection, user_id: &str, trade_id: &str) -> Result<Option<Trade>> {
        let row = sqlx::query_as::<_, StoredTrade>("SELECT * FROM trades WHERE user_id = ? AND id = ?")
            .bind(user_id)
            .bind(trade_id)
            .fetch_optional(&mut *conn)
            .await
            .context("Failed to fetch trade")?;

        row.map(Trade::try_from).transpose()
    }

    async fn insert_row(conn: &mut SqliteConnection, trade: &Trade) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO trades (
                id, user_id, pair, direction, entry_price, exit_price, quantity, quantity_type,
                entry_date, exit_date, stop_loss, take_profit, leverage, exchange, status, outcome,
                profit_loss, profit_loss_percent, fees, notes, tags, screenshots, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&trade.id)
        .bind(&trade.user_id)
        .bind(&trade.pair)
        .bind(trade.direction.as_str())
        .bind(trade.entry_price.to_string())
        .bind(text(trade.exit_price))
        .bind(trade.quantity.to_string())
        .bind(trade.quantity_type.as_str())
        .bind(trade.entry_date.to_rfc3339())
        .bind(trade.exit_date.map(|d| d.to_rfc3339()))
        .bind(text(trade.stop_loss))
        .bind(text(trade.take_profit))
        .bind(trade.leverage as i64)
        .bind(&trade.exchange)
        .bind(trade.status.as_str())
        .bind(trade.outcome.as_str())
        .bind(trade.profit_loss.to_string())
        .bind(trade.profit_loss_percent.to_string())
        .bind(trade.fees.to_string())
        .bind(&trade.notes)
        .bind(serde_json::to_string(&trade.tags)?)
        .bind(serde_json::to_string(&trade.screenshots)?)
        .bind(trade.created_at.to_rfc3339())
        .bind(trade.updated_at.to_rfc3339())
        .execute(&mut *conn)
        .await
        .with_context(|| format!("Failed to insert trade {}", trade.id))?;

        Ok(())
    }

    /// Overwrite every mutable column of an existing row. Returns whether a row matched.
    async fn write(conn: &mut SqliteConnection, user_id: &str, trade: &Trade) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE trades SET
                pair = ?,
                direction = ?,
                entry_price = ?,
                exit_price = ?,
                quantity = ?,
                quantity_type = ?,
                entry_date = ?,
                exit_date = ?,
                stop_loss = ?,
                take_profit = ?,
                leverage = ?,
                exchange = ?,
                status = ?,
                outcome = ?,
                profit_loss = ?,
                profit_loss_percent = ?,
                fees = ?,
                notes = ?,
                tags = ?,
                screenshots = ?,
                updated_at = ?
            WHERE user_id = ? AND id = ?
            "#,
        )
        .bind(&trade.pair)
        .bind(trade.direction.as_str())
        .bind(trade.entry_price.to_string())
        .bind(text(trade.exit_price))
        .bind(trade.quantity.to_string())
        .bind(trade.quantity_type.as_str())
        .bind(trade.entry_date.to_rfc3339())
        .bind(trade.exit_date.map(|d| d.to_rfc3339()))
        .bind(text(trade.stop_loss))
        .bind(text(trade.take_profit))
        .bind(trade.leverage as i64)
        .bind(&trade.exchange)
        .bind(trade.status.as_str())
        .bind(trade.outcome.as_str())
        .bind(trade.profit_loss.to_string())
        .bind(trade.profit_loss_percent.to_string())
        .bind(trade.fees.to_string())
        .bind(&trade.notes)
        .bind(serde_json::to_string(&trade.tags)?)
        .bind(serde_json::to_string(&trade.screenshots)?)
        .bind(trade.updated_at.to_rfc3339())
        .bind(user_id)
        .bind(&trade.id)
        .execute(&mut *conn)
        .await
        .context("Failed to update trade")?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TradeRepository for SqliteTradeStore {
    async fn list(&self, user_id: &str) -> Result<Vec<Trade>> {
        let rows = sqlx::query_as::<_, StoredTrade>(
            "SELECT * FROM trades WHERE user_id = ? ORDER BY rowid",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch trades")?;

        rows.into_iter().map(Trade::try_from).collect()
    }

    async fn get(&self, user_id: &str, trade_id: &str) -> Result<Option<Trade>> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_one(&mut conn, user_id, trade_id).await
    }

    async fn insert(&self, trade: &Trade) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        Self::insert_row(&mut conn, trade).await
    }

    async fn insert_all(&self, trades: &[Trade]) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to start transaction")?;
        for trade in trades {
            Self::insert_row(&mut tx, trade).await?;
        }
        tx.commit().await.context("Failed to commit trade batch")?;
        Ok(())
    }

    async fn remove(&self, user_id: &str, trade_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM trades WHERE user_id = ? AND id = ?")
            .bind(user_id)
            .bind(trade_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete trade")?;

        Ok(result.rows_affected() > 0)
    }

    async fn modify(&self, user_id: &str, trade_id: &str, edit: TradeEdit) -> Result<Option<Trade>> {
        let mut tx = self.pool.begin().await.context("Failed to start transaction")?;

        let Some(mut trade) = Self::fetch_one(&mut tx, user_id, trade_id).await? else {
            return Ok(None);
        };

        if !edit(&mut trade) {
            return Ok(None);
        }

        trade.id = trade_id.to_string();
        trade.user_id = user_id.to_string();
        Self::write(&mut tx, user_id, &trade).await?;
        tx.commit().await.context("Failed to commit trade update")?;

        Ok(Some(trade))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::journal::TradeJournal;
    use crate::models::NewTrade;
    use rust_decimal_macros::dec;

    const ALICE: &str = "alice@example.com";

    #[tokio::test]
    async fn test_round_trip_through_sqlite() {
        let db = Database::in_memory().await.unwrap();
        let journal = TradeJournal::new(db.trades());

        let mut new = NewTrade::new("SOL/USDT", Direction::Short, dec!(150.25), dec!(1000));
        new.quantity_type = QuantityType::Quote;
        new.stop_loss = Some(dec!(160));
        new.tags = vec!["breakdown".to_string()];
        new.notes = "weekly level".to_string();
        let added = journal.add(ALICE, new).await.unwrap();

        let loaded = journal.get(ALICE, &added.id).await.unwrap().unwrap();
        assert_eq!(loaded, added);
    }

    #[tokio::test]
    async fn test_close_in_transaction() {
        let db = Database::in_memory().await.unwrap();
        let journal = TradeJournal::new(db.trades());

        let added = journal
            .add(ALICE, NewTrade::new("BTC/USDT", Direction::Long, dec!(60000), dec!(0.5)))
            .await
            .unwrap();

        let closed = journal
            .close(ALICE, &added.id, dec!(61000), Utc::now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(closed.profit_loss, dec!(500));

        assert!(journal
            .close(ALICE, &added.id, dec!(70000), Utc::now())
            .await
            .unwrap()
            .is_none());
        let stored = journal.get(ALICE, &added.id).await.unwrap().unwrap();
        assert_eq!(stored.exit_price, Some(dec!(61000)));
        assert_eq!(stored.status, TradeStatus::Closed);
    }

    #[tokio::test]
    async fn test_owner_partitioning_and_order() {
        let db = Database::in_memory().await.unwrap();
        let journal = TradeJournal::new(db.trades());

        let first = journal
            .add(ALICE, NewTrade::new("ETH/USDT", Direction::Long, dec!(3000), dec!(1)))
            .await
            .unwrap();
        let second = journal
            .add(ALICE, NewTrade::new("BTC/USDT", Direction::Long, dec!(60000), dec!(1)))
            .await
            .unwrap();
        journal
            .add("bob@example.com", NewTrade::new("ETH/USDT", Direction::Short, dec!(3000), dec!(1)))
            .await
            .unwrap();

        let ids: Vec<String> = journal.list(ALICE).await.unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![first.id.clone(), second.id]);

        assert!(!journal.delete("bob@example.com", &first.id).await.unwrap());
        assert!(journal.delete(ALICE, &first.id).await.unwrap());
        assert!(!journal.delete(ALICE, &first.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_batch_insert_is_all_or_nothing() {
        let db = Database::in_memory().await.unwrap();
        let journal = TradeJournal::new(db.trades());

        let existing = journal
            .add(ALICE, NewTrade::new("ETH/USDT", Direction::Long, dec!(3000), dec!(1)))
            .await
            .unwrap();

        let mut fresh = existing.clone();
        fresh.id = "fresh".to_string();
        // Second row collides on the primary key
        let batch = vec![fresh, existing.clone()];

        let store = db.trades();
        assert!(store.insert_all(&batch).await.is_err());
        assert!(store.get(ALICE, "fresh").await.unwrap().is_none());
        assert_eq!(store.list(ALICE).await.unwrap().len(), 1);
    }
}
