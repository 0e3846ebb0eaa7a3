//! Journal operations on top of a [`TradeRepository`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::metrics::StatsCalculator;
use crate::models::{NewTrade, Trade, TradeOutcome, TradePatch, TradeStats, TradeStatus};
use super::csv_io::{export_trades, parse_trades};
use super::{TradeFilter, TradeRepository};

/// Highest leverage the journal accepts on a record.
pub const MAX_JOURNAL_LEVERAGE: u32 = 125;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("entry price must be greater than zero")]
    InvalidEntryPrice,

    #[error("quantity must be greater than zero")]
    InvalidQuantity,

    #[error("leverage must be between 1x and 125x, got {0}x")]
    InvalidLeverage(u32),

    #[error("exit price must be greater than zero")]
    InvalidExitPrice,

    #[error("prices and quantity are too large to compute P&L")]
    Overflow,

    #[error("CSV line {line}: {message}")]
    Csv { line: u64, message: String },

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Trade journal service, generic over its store.
pub struct TradeJournal<R> {
    repo: R,
}

impl<R: TradeRepository> TradeJournal<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Record a new trade. With an exit price it is stored already closed.
    pub async fn add(&self, user_id: &str, new: NewTrade) -> Result<Trade, JournalError> {
        let trade = build_trade(user_id, new, Utc::now())?;
        self.repo.insert(&trade).await?;

        info!(
            user = %user_id,
            trade_id = %trade.id,
            pair = %trade.pair,
            status = trade.status.as_str(),
            "Trade recorded"
        );
        Ok(trade)
    }

    /// Apply a partial edit. P&L is recomputed whenever the edited trade has an exit price.
    pub async fn update(
        &self,
        user_id: &str,
        trade_id: &str,
        mut patch: TradePatch,
    ) -> Result<Option<Trade>, JournalError> {
        if patch.entry_price.is_some_and(|p| p <= Decimal::ZERO) {
            return Err(JournalError::InvalidEntryPrice);
        }
        if patch.quantity.is_some_and(|q| q <= Decimal::ZERO) {
            return Err(JournalError::InvalidQuantity);
        }
        if let Some(leverage) = patch.leverage {
            validate_leverage(leverage)?;
        }
        if patch.exit_price.is_some_and(|p| p <= Decimal::ZERO) {
            return Err(JournalError::InvalidExitPrice);
        }
        patch.pair = patch.pair.as_deref().map(normalize_pair);

        let overflowed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&overflowed);
        let updated = self
            .repo
            .modify(
                user_id,
                trade_id,
                Box::new(move |trade: &mut Trade| {
                    let now = Utc::now();
                    patch.apply(trade);
                    if let Some(exit_price) = trade.exit_price {
                        let exit_date = trade.exit_date.unwrap_or(now);
                        if trade.settle(exit_price, exit_date).is_none() {
                            flag.store(true, Ordering::Relaxed);
                            return false;
                        }
                    }
                    trade.updated_at = now;
                    true
                }),
            )
            .await?;

        if overflowed.load(Ordering::Relaxed) {
            return Err(JournalError::Overflow);
        }

        match &updated {
            Some(trade) => debug!(user = %user_id, trade_id = %trade.id, "Trade updated"),
            None => debug!(user = %user_id, trade_id = %trade_id, "Trade not found for update"),
        }
        Ok(updated)
    }

    /// Close an open trade. `None` when it is missing or already closed; the record is then untouched.
    pub async fn close(
        &self,
        user_id: &str,
        trade_id: &str,
        exit_price: Decimal,
        exit_date: DateTime<Utc>,
    ) -> Result<Option<Trade>, JournalError> {
        if exit_price <= Decimal::ZERO {
            return Err(JournalError::InvalidExitPrice);
        }

        let overflowed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&overflowed);
        let closed = self
            .repo
            .modify(
                user_id,
                trade_id,
                Box::new(move |trade: &mut Trade| {
                    if !trade.is_open() {
                        return false;
                    }
                    if trade.settle(exit_price, exit_date).is_none() {
                        flag.store(true, Ordering::Relaxed);
                        return false;
                    }
                    trade.updated_at = Utc::now();
                    true
                }),
            )
            .await?;

        if overflowed.load(Ordering::Relaxed) {
            return Err(JournalError::Overflow);
        }

        if let Some(trade) = &closed {
            info!(
                user = %user_id,
                trade_id = %trade.id,
                pnl = %trade.profit_loss.round_dp(2),
                outcome = trade.outcome.as_str(),
                "Trade closed"
            );
        }
        Ok(closed)
    }

    pub async fn delete(&self, user_id: &str, trade_id: &str) -> Result<bool, JournalError> {
        let removed = self.repo.remove(user_id, trade_id).await?;
        if removed {
            info!(user = %user_id, trade_id = %trade_id, "Trade deleted");
        }
        Ok(removed)
    }

    pub async fn get(&self, user_id: &str, trade_id: &str) -> Result<Option<Trade>, JournalError> {
        Ok(self.repo.get(user_id, trade_id).await?)
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<Trade>, JournalError> {
        Ok(self.repo.list(user_id).await?)
    }

    pub async fn list_filtered(
        &self,
        user_id: &str,
        filter: TradeFilter,
    ) -> Result<Vec<Trade>, JournalError> {
        let trades = self.repo.list(user_id).await?;
        Ok(trades.into_iter().filter(|t| filter.matches(t)).collect())
    }

    pub async fn stats(&self, user_id: &str) -> Result<TradeStats, JournalError> {
        let trades = self.repo.list(user_id).await?;
        Ok(StatsCalculator::calculate(&trades))
    }

    pub async fn export_csv(&self, user_id: &str) -> Result<String, JournalError> {
        let trades = self.repo.list(user_id).await?;
        Ok(export_trades(&trades)?)
    }

    /// Add every row of an exported CSV as a new trade.
    /// All rows are checked first and then stored in one batch, so a failure stores nothing.
    pub async fn import_csv(&self, user_id: &str, text: &str) -> Result<usize, JournalError> {
        let rows = parse_trades(text)?;
        let now = Utc::now();

        let trades = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                build_trade(user_id, row, now).map_err(|e| JournalError::Csv {
                    // Header is line 1
                    line: i as u64 + 2,
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.repo.insert_all(&trades).await?;

        info!(user = %user_id, count = trades.len(), "Imported trades from CSV");
        Ok(trades.len())
    }
}

/// Validate `new` and turn it into a stored record, settled when it has an exit price.
fn build_trade(user_id: &str, new: NewTrade, now: DateTime<Utc>) -> Result<Trade, JournalError> {
    validate_prices(new.entry_price, new.quantity, new.leverage, new.exit_price)?;

    let mut trade = Trade {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        pair: normalize_pair(&new.pair),
        direction: new.direction,
        entry_price: new.entry_price,
        exit_price: None,
        quantity: new.quantity,
        quantity_type: new.quantity_type,
        entry_date: new.entry_date,
        exit_date: None,
        stop_loss: new.stop_loss,
        take_profit: new.take_profit,
        leverage: new.leverage,
        exchange: new.exchange,
        status: TradeStatus::Open,
        outcome: TradeOutcome::Pending,
        profit_loss: Decimal::ZERO,
        profit_loss_percent: Decimal::ZERO,
        fees: new.fees,
        notes: new.notes,
        tags: new.tags,
        screenshots: new.screenshots,
        created_at: now,
        updated_at: now,
    };

    match new.exit_price {
        Some(exit_price) => {
            trade
                .settle(exit_price, new.exit_date.unwrap_or(now))
                .ok_or(JournalError::Overflow)?;
        }
        None => trade.exit_date = new.exit_date,
    }

    Ok(trade)
}

fn normalize_pair(pair: &str) -> String {
    pair.trim().to_uppercase()
}

fn validate_leverage(leverage: u32) -> Result<(), JournalError> {
    if !(1..=MAX_JOURNAL_LEVERAGE).contains(&leverage) {
        return Err(JournalError::InvalidLeverage(leverage));
    }
    Ok(())
}

fn validate_prices(
    entry_price: Decimal,
    quantity: Decimal,
    leverage: u32,
    exit_price: Option<Decimal>,
) -> Result<(), JournalError> {
    if entry_price <= Decimal::ZERO {
        return Err(JournalError::InvalidEntryPrice);
    }
    if quantity <= Decimal::ZERO {
        return Err(JournalError::InvalidQuantity);
    }
    validate_leverage(leverage)?;
    if exit_price.is_some_and(|p| p <= Decimal::ZERO) {
        return Err(JournalError::InvalidExitPrice);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::InMemoryTradeStore;
    use crate::models::{Direction, QuantityType};
    use rust_decimal_macros::dec;

    const ALICE: &str = "alice@example.com";
    const BOB: &str = "bob@example.com";

    fn journal() -> TradeJournal<InMemoryTradeStore> {
        TradeJournal::new(InMemoryTradeStore::new())
    }

    fn eth_long() -> NewTrade {
        NewTrade::new("ETH/USDT", Direction::Long, dec!(3000), dec!(2))
    }

    #[tokio::test]
    async fn test_add_open_trade() {
        let j = journal();
        let trade = j.add(ALICE, eth_long()).await.unwrap();

        assert_eq!(trade.status, TradeStatus::Open);
        assert_eq!(trade.outcome, TradeOutcome::Pending);
        assert_eq!(trade.profit_loss, Decimal::ZERO);
        assert_eq!(trade.user_id, ALICE);
        assert!(Uuid::parse_str(&trade.id).is_ok());
    }

    #[tokio::test]
    async fn test_add_with_exit_is_closed() {
        let j = journal();
        let mut new = eth_long();
        new.exit_price = Some(dec!(3150));
        new.leverage = 10;
        let trade = j.add(ALICE, new).await.unwrap();

        assert_eq!(trade.status, TradeStatus::Closed);
        assert_eq!(trade.outcome, TradeOutcome::Win);
        assert_eq!(trade.profit_loss, dec!(300));
        assert_eq!(trade.profit_loss_percent, dec!(50));
    }

    #[tokio::test]
    async fn test_add_validation() {
        let j = journal();

        let mut bad = eth_long();
        bad.entry_price = Decimal::ZERO;
        assert!(matches!(j.add(ALICE, bad).await, Err(JournalError::InvalidEntryPrice)));

        let mut bad = eth_long();
        bad.quantity = dec!(-1);
        assert!(matches!(j.add(ALICE, bad).await, Err(JournalError::InvalidQuantity)));

        let mut bad = eth_long();
        bad.leverage = 126;
        assert!(matches!(j.add(ALICE, bad).await, Err(JournalError::InvalidLeverage(126))));

        let mut bad = eth_long();
        bad.exit_price = Some(Decimal::ZERO);
        assert!(matches!(j.add(ALICE, bad).await, Err(JournalError::InvalidExitPrice)));

        assert!(j.list(ALICE).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_close_short_with_quote_quantity() {
        let j = journal();
        let mut new = NewTrade::new("BTC/USDT", Direction::Short, dec!(50000), dec!(5000));
        new.quantity_type = QuantityType::Quote;
        let trade = j.add(ALICE, new).await.unwrap();

        let closed = j
            .close(ALICE, &trade.id, dec!(45000), Utc::now())
            .await
            .unwrap()
            .unwrap();

        // 0.1 BTC short from 50k to 45k
        assert_eq!(closed.profit_loss, dec!(500));
        assert_eq!(closed.profit_loss_percent, dec!(10));
        assert_eq!(closed.outcome, TradeOutcome::Win);
        assert_eq!(closed.exit_price, Some(dec!(45000)));
    }

    #[tokio::test]
    async fn test_close_twice_returns_none() {
        let j = journal();
        let trade = j.add(ALICE, eth_long()).await.unwrap();

        let first = j.close(ALICE, &trade.id, dec!(2900), Utc::now()).await.unwrap().unwrap();
        assert_eq!(first.outcome, TradeOutcome::Loss);

        let second = j.close(ALICE, &trade.id, dec!(4000), Utc::now()).await.unwrap();
        assert!(second.is_none());

        let stored = j.get(ALICE, &trade.id).await.unwrap().unwrap();
        assert_eq!(stored, first);
    }

    #[tokio::test]
    async fn test_close_at_entry_is_loss() {
        let j = journal();
        let trade = j.add(ALICE, eth_long()).await.unwrap();
        let closed = j.close(ALICE, &trade.id, dec!(3000), Utc::now()).await.unwrap().unwrap();
        assert_eq!(closed.profit_loss, Decimal::ZERO);
        assert_eq!(closed.outcome, TradeOutcome::Loss);
    }

    #[tokio::test]
    async fn test_update_recomputes_pnl() {
        let j = journal();
        let mut new = eth_long();
        new.exit_price = Some(dec!(3100));
        let trade = j.add(ALICE, new).await.unwrap();
        assert_eq!(trade.profit_loss, dec!(200));

        let patch = TradePatch {
            entry_price: Some(dec!(3050)),
            notes: Some("filled higher".to_string()),
            ..Default::default()
        };
        let updated = j.update(ALICE, &trade.id, patch).await.unwrap().unwrap();

        assert_eq!(updated.profit_loss, dec!(100));
        assert_eq!(updated.notes, "filled higher");
        assert!(updated.updated_at >= trade.updated_at);
    }

    #[tokio::test]
    async fn test_update_open_trade_keeps_it_open() {
        let j = journal();
        let trade = j.add(ALICE, eth_long()).await.unwrap();
        let patch = TradePatch {
            stop_loss: Some(dec!(2900)),
            ..Default::default()
        };
        let updated = j.update(ALICE, &trade.id, patch).await.unwrap().unwrap();
        assert_eq!(updated.status, TradeStatus::Open);
        assert_eq!(updated.stop_loss, Some(dec!(2900)));
    }

    #[tokio::test]
    async fn test_missing_ids() {
        let j = journal();
        let trade = j.add(ALICE, eth_long()).await.unwrap();

        assert!(!j.delete(ALICE, "missing").await.unwrap());
        assert!(j.update(ALICE, "missing", TradePatch::default()).await.unwrap().is_none());
        // Other users cannot reach the trade
        assert!(!j.delete(BOB, &trade.id).await.unwrap());
        assert!(j.close(BOB, &trade.id, dec!(3100), Utc::now()).await.unwrap().is_none());
        assert!(j.delete(ALICE, &trade.id).await.unwrap());
        assert!(j.list(ALICE).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_filters_and_stats() {
        let j = journal();
        let a = j.add(ALICE, eth_long()).await.unwrap();
        let b = j.add(ALICE, eth_long()).await.unwrap();
        j.add(ALICE, eth_long()).await.unwrap();
        j.close(ALICE, &a.id, dec!(3100), Utc::now()).await.unwrap();
        j.close(ALICE, &b.id, dec!(2950), Utc::now()).await.unwrap();

        assert_eq!(j.list_filtered(ALICE, TradeFilter::Open).await.unwrap().len(), 1);
        assert_eq!(j.list_filtered(ALICE, TradeFilter::Closed).await.unwrap().len(), 2);
        assert_eq!(j.list_filtered(ALICE, TradeFilter::Wins).await.unwrap().len(), 1);
        assert_eq!(j.list_filtered(ALICE, TradeFilter::Losses).await.unwrap().len(), 1);

        let stats = j.stats(ALICE).await.unwrap();
        assert_eq!(stats.total_trades, 3);
        assert_eq!(stats.total_profit_loss, dec!(100));
        assert!((stats.profit_factor - 2.0).abs() < 1e-9);
        assert_eq!(j.stats(BOB).await.unwrap().total_trades, 0);
    }

    #[tokio::test]
    async fn test_csv_round_trip() {
        let j = journal();
        let mut closed = eth_long();
        closed.exit_price = Some(dec!(3200));
        closed.notes = "took profit, \"early\"".to_string();
        closed.exchange = "bybit".to_string();
        j.add(ALICE, closed).await.unwrap();
        let mut open = NewTrade::new("BTC/USDT", Direction::Short, dec!(65000), dec!(0.05));
        open.leverage = 20;
        j.add(ALICE, open).await.unwrap();
        let mut quoted = NewTrade::new("SOL/USDT", Direction::Long, dec!(150), dec!(1500));
        quoted.quantity_type = QuantityType::Quote;
        quoted.exit_price = Some(dec!(165));
        j.add(ALICE, quoted).await.unwrap();

        let csv = j.export_csv(ALICE).await.unwrap();
        let imported = j.import_csv(BOB, &csv).await.unwrap();
        assert_eq!(imported, 3);

        let original = j.list(ALICE).await.unwrap();
        let copy = j.list(BOB).await.unwrap();
        for (a, b) in original.iter().zip(copy.iter()) {
            assert_eq!(a.pair, b.pair);
            assert_eq!(a.direction, b.direction);
            assert_eq!(a.entry_price, b.entry_price);
            assert_eq!(a.exit_price, b.exit_price);
            assert_eq!(a.quantity, b.quantity);
            assert_eq!(a.quantity_type, b.quantity_type);
            assert_eq!(a.leverage, b.leverage);
            assert_eq!(a.exchange, b.exchange);
            assert_eq!(a.status, b.status);
            assert_eq!(a.outcome, b.outcome);
            assert_eq!(a.profit_loss, b.profit_loss);
            assert_eq!(a.notes, b.notes);
            assert_eq!(a.entry_date.timestamp_millis(), b.entry_date.timestamp_millis());
        }
        assert_eq!(j.export_csv(BOB).await.unwrap(), csv);
    }

    #[tokio::test]
    async fn test_import_rejects_bad_row_without_partial_writes() {
        let j = journal();
        let csv = format!(
            "{}\n{}\n{}",
            crate::journal::CSV_HEADER,
            "2024-05-01T10:00:00.000Z,ETH/USDT,long,3000,,1,1,binance,open,pending,0.00,0.00,\"\"",
            "2024-05-02T10:00:00.000Z,ETH/USDT,long,3000,,1,500,binance,open,pending,0.00,0.00,\"\"",
        );

        match j.import_csv(ALICE, &csv).await {
            Err(JournalError::Csv { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(j.list(ALICE).await.unwrap().is_empty());
    }

    fn huge_long() -> NewTrade {
        NewTrade::new(
            "BTC/USDT",
            Direction::Long,
            dec!(1000000000000000),
            dec!(1000000000000000),
        )
    }

    #[tokio::test]
    async fn test_add_out_of_range_pnl_is_rejected() {
        let j = journal();
        let mut new = huge_long();
        new.exit_price = Some(dec!(2000000000000000));

        assert!(matches!(j.add(ALICE, new).await, Err(JournalError::Overflow)));
        assert!(j.list(ALICE).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_close_and_edit_out_of_range_leave_record() {
        let j = journal();
        let trade = j.add(ALICE, huge_long()).await.unwrap();

        let result = j.close(ALICE, &trade.id, dec!(2000000000000000), Utc::now()).await;
        assert!(matches!(result, Err(JournalError::Overflow)));

        let patch = TradePatch {
            exit_price: Some(dec!(2000000000000000)),
            ..Default::default()
        };
        assert!(matches!(j.update(ALICE, &trade.id, patch).await, Err(JournalError::Overflow)));

        let stored = j.get(ALICE, &trade.id).await.unwrap().unwrap();
        assert_eq!(stored, trade);

        // A closable price still works afterwards
        let closed = j.close(ALICE, &trade.id, dec!(1000000000000001), Utc::now()).await.unwrap().unwrap();
        assert_eq!(closed.profit_loss, dec!(1000000000000000));
    }

    #[tokio::test]
    async fn test_update_normalizes_pair() {
        let j = journal();
        let trade = j.add(ALICE, eth_long()).await.unwrap();
        let patch = TradePatch {
            pair: Some("  sol/usdt ".to_string()),
            ..Default::default()
        };
        let updated = j.update(ALICE, &trade.id, patch).await.unwrap().unwrap();
        assert_eq!(updated.pair, "SOL/USDT");
    }

    #[tokio::test]
    async fn test_csv_round_trip_with_delimiters_in_text() {
        let j = journal();
        let mut new = NewTrade::new("btc,x/usdt", Direction::Long, dec!(100), dec!(3));
        new.exit_price = Some(dec!(110));
        new.exchange = "my \"desk\", two".to_string();
        new.notes = "line one, \"quoted\"\nline two".to_string();
        let original = j.add(ALICE, new).await.unwrap();

        let csv = j.export_csv(ALICE).await.unwrap();
        assert_eq!(j.import_csv(BOB, &csv).await.unwrap(), 1);

        let copy = &j.list(BOB).await.unwrap()[0];
        assert_eq!(copy.pair, "BTC,X/USDT");
        assert_eq!(copy.exchange, original.exchange);
        assert_eq!(copy.notes, original.notes);
        assert_eq!(copy.profit_loss, dec!(30));
    }

    #[tokio::test]
    async fn test_import_rejects_out_of_range_row() {
        let j = journal();
        let csv = format!(
            "{}\n{}\n{}",
            crate::journal::CSV_HEADER,
            "2024-05-01T10:00:00.000Z,ETH/USDT,long,3000,3100,1,1,binance,closed,win,100.00,3.33,",
            "2024-05-02T10:00:00.000Z,BTC/USDT,long,1000000000000000,2000000000000000,1000000000000000,1,binance,closed,win,0.00,0.00,",
        );

        match j.import_csv(ALICE, &csv).await {
            Err(JournalError::Csv { line, message }) => {
                assert_eq!(line, 3);
                assert!(message.contains("too large"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(j.list(ALICE).await.unwrap().is_empty());
    }
}
