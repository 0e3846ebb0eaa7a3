//! Calculator for journal statistics: win rate, profit factor, best pair, etc.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use statrs::statistics::Statistics;

use crate::models::{Trade, TradeOutcome, TradeStats, TradeStatus};

/// Computes [`TradeStats`] from a user's trades.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Aggregate statistics over `trades`. Only closed trades feed the P&L figures.
    pub fn calculate(trades: &[Trade]) -> TradeStats {
        let mut stats = TradeStats::default();

        stats.total_trades = trades.len() as u32;
        stats.open_trades = trades.iter().filter(|t| t.status == TradeStatus::Open).count() as u32;

        let closed: Vec<&Trade> = trades
            .iter()
            .filter(|t| t.status == TradeStatus::Closed)
            .collect();

        if closed.is_empty() {
            return stats;
        }

        stats.closed_trades = closed.len() as u32;

        Self::calculate_pnl_metrics(&mut stats, &closed);
        Self::calculate_dispersion(&mut stats, &closed);
        Self::calculate_rankings(&mut stats, &closed);

        stats
    }

    /// Win/loss counts, averages, extremes and profit factor.
    fn calculate_pnl_metrics(stats: &mut TradeStats, closed: &[&Trade]) {
        let wins: Vec<Decimal> = closed
            .iter()
            .filter(|t| t.outcome == TradeOutcome::Win)
            .map(|t| t.profit_loss)
            .collect();
        let losses: Vec<Decimal> = closed
            .iter()
            .filter(|t| t.outcome == TradeOutcome::Loss)
            .map(|t| t.profit_loss)
            .collect();

        stats.wins = wins.len() as u32;
        stats.losses = losses.len() as u32;
        stats.win_rate = wins.len() as f64 / closed.len() as f64 * 100.0;

        stats.total_profit_loss = total(closed.iter().map(|t| t.profit_loss));
        stats.expectancy = stats.total_profit_loss / Decimal::from(closed.len() as u32);

        let gross_wins = total(wins.iter().copied());
        let gross_losses = total(losses.iter().copied()).abs();

        if !wins.is_empty() {
            stats.avg_win = gross_wins / Decimal::from(wins.len() as u32);
            stats.largest_win = wins.iter().copied().max().unwrap_or_default();
        }
        if !losses.is_empty() {
            stats.avg_loss = gross_losses / Decimal::from(losses.len() as u32);
            stats.largest_loss = losses.iter().copied().min().unwrap_or_default();
        }

        stats.profit_factor = if gross_losses > Decimal::ZERO {
            gross_wins.to_f64().unwrap_or(0.0) / gross_losses.to_f64().unwrap_or(1.0)
        } else if gross_wins > Decimal::ZERO {
            f64::INFINITY
        } else {
            0.0
        };
    }

    /// Spread of closed-trade P&L.
    fn calculate_dispersion(stats: &mut TradeStats, closed: &[&Trade]) {
        if closed.len() < 2 {
            return;
        }

        let pnls: Vec<f64> = closed
            .iter()
            .filter_map(|t| t.profit_loss.to_f64())
            .collect();

        let std_dev = pnls.std_dev();
        if std_dev.is_finite() {
            stats.pnl_std_dev = std_dev;
        }
    }

    /// Best/worst pair and best exchange by summed P&L.
    fn calculate_rankings(stats: &mut TradeStats, closed: &[&Trade]) {
        let pairs = Self::ranked_totals(closed, |t| t.pair.as_str());
        if let (Some(best), Some(worst)) = (pairs.first(), pairs.last()) {
            stats.best_pair = best.0.to_string();
            stats.worst_pair = worst.0.to_string();
        }

        let exchanges = Self::ranked_totals(closed, |t| t.exchange.as_str());
        if let Some(best) = exchanges.first() {
            stats.best_exchange = best.0.to_string();
        }
    }

    /// Sum P&L per key, sorted descending. Ties keep first-seen order.
    fn ranked_totals<'t>(
        closed: &[&'t Trade],
        key: impl Fn(&'t Trade) -> &'t str,
    ) -> Vec<(&'t str, Decimal)> {
        let mut totals: Vec<(&str, Decimal)> = Vec::new();

        for trade in closed {
            let k = key(*trade);
            match totals.iter_mut().find(|(name, _)| *name == k) {
                Some((_, sum)) => *sum = sum.saturating_add(trade.profit_loss),
                None => totals.push((k, trade.profit_loss)),
            }
        }

        totals.sort_by(|a, b| b.1.cmp(&a.1));
        totals
    }
}

/// Sum that clamps at the `Decimal` bounds instead of overflowing.
fn total(values: impl Iterator<Item = Decimal>) -> Decimal {
    values.fold(Decimal::ZERO, Decimal::saturating_add)
}
