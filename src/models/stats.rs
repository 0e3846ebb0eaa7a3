//! Aggregate journal statistics. Always derived from the trade list, never stored.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Placeholder used for best/worst rankings when nothing is closed yet.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeStats {
    // === Counts ===
    pub total_trades: u32,
    pub open_trades: u32,
    pub closed_trades: u32,
    pub wins: u32,
    pub losses: u32,

    /// Percentage of closed trades that won (0 to 100)
    pub win_rate: f64,

    // === P&L ===
    pub total_profit_loss: Decimal,

    /// Mean P&L of winning trades
    pub avg_win: Decimal,

    /// Mean absolute P&L of losing trades
    pub avg_loss: Decimal,

    pub largest_win: Decimal,

    /// Most negative single P&L (stays signed)
    pub largest_loss: Decimal,

    /// Gross wins / |gross losses|; infinite with wins and no losses
    pub profit_factor: f64,

    /// Total P&L per closed trade
    pub expectancy: Decimal,

    /// Sample standard deviation of closed-trade P&L, 0 with fewer than two
    pub pnl_std_dev: f64,

    // === Rankings ===
    pub best_pair: String,
    pub worst_pair: String,
    pub best_exchange: String,
}

impl Default for TradeStats {
    fn default() -> Self {
        Self {
            total_trades: 0,
            open_trades: 0,
            closed_trades: 0,
            wins: 0,
            losses: 0,
            win_rate: 0.0,
            total_profit_loss: Decimal::ZERO,
            avg_win: Decimal::ZERO,
            avg_loss: Decimal::ZERO,
            largest_win: Decimal::ZERO,
            largest_loss: Decimal::ZERO,
            profit_factor: 0.0,
            expectancy: Decimal::ZERO,
            pnl_std_dev: 0.0,
            best_pair: NOT_AVAILABLE.to_string(),
            worst_pair: NOT_AVAILABLE.to_string(),
            best_exchange: NOT_AVAILABLE.to_string(),
        }
    }
}

impl TradeStats {
    pub fn has_closed_trades(&self) -> bool {
        self.closed_trades > 0
    }

    /// Profit factor for display ("∞" when there are no losses).
    pub fn profit_factor_label(&self) -> String {
        if self.profit_factor.is_infinite() {
            "∞".to_string()
        } else {
            format!("{:.2}", self.profit_factor)
        }
    }
}
