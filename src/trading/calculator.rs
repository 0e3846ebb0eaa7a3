//! Risk-based position sizing with leverage, liquidation, fee and funding estimates.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::exchange::{AccountType, ExchangeTable};
use crate::models::Direction;
use super::RiskConfig;

/// Names given to take-profit slots, in input order.
pub const TAKE_PROFIT_NAMES: [&str; 3] = ["TP1", "TP2", "TP3"];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("{0} is not a valid number")]
    InvalidNumber(&'static str),

    #[error("entry price and stop price are equal")]
    ZeroStopDistance,

    #[error("entry price is zero")]
    ZeroEntry,
}

/// Raw calculator inputs as typed by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationInput {
    pub account_balance: String,
    pub risk_percent: String,
    pub entry_price: String,
    pub stop_price: String,
    /// Up to three targets; blank or unparseable slots are skipped
    pub take_profits: Vec<String>,
    pub direction: Direction,
    pub leverage: String,
    pub use_leverage: bool,
    pub exchange: String,
    pub account_type: AccountType,
}

impl Default for CalculationInput {
    fn default() -> Self {
        Self {
            account_balance: "10000".to_string(),
            risk_percent: "1".to_string(),
            entry_price: "3500".to_string(),
            stop_price: "3400".to_string(),
            take_profits: vec!["3800".to_string()],
            direction: Direction::Long,
            leverage: "1".to_string(),
            use_leverage: false,
            exchange: crate::exchange::DEFAULT_EXCHANGE.to_string(),
            account_type: AccountType::Futures,
        }
    }
}

impl CalculationInput {
    /// Leverage actually applied: 1 unless leverage mode is on.
    pub fn effective_leverage(&self) -> Result<f64, CalcError> {
        if !self.use_leverage {
            return Ok(1.0);
        }
        let leverage = parse_required(&self.leverage, "leverage")?;
        if leverage < 1.0 {
            return Err(CalcError::InvalidNumber("leverage"));
        }
        Ok(leverage)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TakeProfitResult {
    pub name: String,
    pub price: f64,
    pub percent_gain: f64,
    pub profit: f64,
    pub reward_ratio: f64,
}

/// Position-sizing report for one set of inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    /// |entry - stop| / entry, in percent
    pub stop_loss_distance: f64,
    pub risk_amount: f64,
    /// Notional at 1x that loses `risk_amount` at the stop
    pub position_size: f64,
    /// Base units
    pub quantity: f64,
    pub leverage: f64,
    pub leveraged_position_size: f64,
    pub margin_required: f64,
    /// 0 when leverage is off or 1x
    pub liquidation_price: f64,
    pub distance_to_liquidation: f64,
    pub breakeven_price: f64,
    pub win_rate_needed: f64,
    pub take_profits: Vec<TakeProfitResult>,
    /// Profit at the first target, 0 without targets
    pub potential_profit: f64,
    /// Reward/risk at the first target, 0 without targets
    pub reward_ratio: f64,
    pub maintenance_margin: f64,
    pub maintenance_margin_rate: f64,
    pub total_fees: f64,
    pub funding_cost: f64,
    pub max_leverage: u32,
}

/// Position calculator bound to an exchange table.
pub struct PositionCalculator<'a> {
    exchanges: &'a ExchangeTable,
    config: RiskConfig,
}

impl<'a> PositionCalculator<'a> {
    pub fn new(exchanges: &'a ExchangeTable, config: RiskConfig) -> Self {
        Self { exchanges, config }
    }

    pub fn exchanges(&self) -> &ExchangeTable {
        self.exchanges
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Size a position so that hitting the stop loses exactly `risk_percent` of the balance.
    ///
    /// Liquidation uses the isolated-margin approximation `entry × (1 ∓ 1/L)`, which
    /// ignores fees, funding and maintenance tiers; real venues liquidate earlier.
    pub fn calculate(&self, input: &CalculationInput) -> Result<CalculationResult, CalcError> {
        let balance = parse_required(&input.account_balance, "account balance")?;
        let risk = parse_required(&input.risk_percent, "risk percentage")?;
        let entry = parse_required(&input.entry_price, "entry price")?;
        let stop = parse_required(&input.stop_price, "stop price")?;
        let leverage = input.effective_leverage()?;

        if entry == 0.0 {
            return Err(CalcError::ZeroEntry);
        }
        if entry == stop {
            return Err(CalcError::ZeroStopDistance);
        }

        let exchange = self.exchanges.config(&input.exchange);
        let fees = exchange.fees(input.account_type);
        let taker = fees.taker_fraction();

        let stop_distance = (entry - stop).abs() / entry;
        let risk_amount = balance * (risk / 100.0);
        let position_size = risk_amount / stop_distance;
        let quantity = position_size / entry;

        let leveraged_position_size = position_size * leverage;
        let margin_required = leveraged_position_size / leverage;

        let liquidation_price = Self::liquidation_price(input.direction, entry, leverage);
        let distance_to_liquidation = if liquidation_price > 0.0 {
            (entry - liquidation_price).abs() / entry * 100.0
        } else {
            0.0
        };

        let breakeven_distance = entry * taker * 2.0;
        let breakeven_price = match input.direction {
            Direction::Long => entry + breakeven_distance,
            Direction::Short => entry - breakeven_distance,
        };

        let take_profits = Self::take_profit_results(input, entry, stop, quantity, leverage);
        let (potential_profit, reward_ratio) = take_profits
            .first()
            .map(|tp| (tp.profit, tp.reward_ratio))
            .unwrap_or((0.0, 0.0));

        let maintenance_margin_rate = exchange.maintenance_margin_rate(leverage);
        let maintenance_margin = leveraged_position_size * maintenance_margin_rate / 100.0;

        // Taker on both legs
        let total_fees = 2.0 * position_size * taker;

        let funding_cost = exchange.funding_cost(
            input.account_type,
            leveraged_position_size,
            self.config.funding_hours,
        );

        Ok(CalculationResult {
            stop_loss_distance: stop_distance * 100.0,
            risk_amount,
            position_size,
            quantity,
            leverage,
            leveraged_position_size,
            margin_required,
            liquidation_price,
            distance_to_liquidation,
            breakeven_price,
            win_rate_needed: win_rate_needed(reward_ratio),
            take_profits,
            potential_profit,
            reward_ratio,
            maintenance_margin,
            maintenance_margin_rate,
            total_fees,
            funding_cost,
            max_leverage: exchange.max_leverage(input.account_type),
        })
    }

    fn liquidation_price(direction: Direction, entry: f64, leverage: f64) -> f64 {
        if leverage <= 1.0 {
            return 0.0;
        }
        match direction {
            Direction::Long => entry * (1.0 - 1.0 / leverage),
            Direction::Short => entry * (1.0 + 1.0 / leverage),
        }
    }

    fn take_profit_results(
        input: &CalculationInput,
        entry: f64,
        stop: f64,
        quantity: f64,
        leverage: f64,
    ) -> Vec<TakeProfitResult> {
        let risk_per_unit = (entry - stop).abs();

        input
            .take_profits
            .iter()
            .zip(TAKE_PROFIT_NAMES)
            .filter_map(|(raw, name)| parse_optional(raw).map(|price| (name, price)))
            .map(|(name, price)| {
                let distance = (price - entry).abs();
                TakeProfitResult {
                    name: name.to_string(),
                    price,
                    percent_gain: distance / entry * 100.0,
                    profit: quantity * distance * leverage,
                    reward_ratio: distance / risk_per_unit,
                }
            })
            .collect()
    }
}

/// Break-even win rate (%) for a reward/risk ratio; 0 when the ratio is not positive.
pub fn win_rate_needed(reward_ratio: f64) -> f64 {
    if reward_ratio > 0.0 {
        1.0 / (1.0 + reward_ratio) * 100.0
    } else {
        0.0
    }
}

fn parse_required(raw: &str, field: &'static str) -> Result<f64, CalcError> {
    parse_optional(raw).ok_or(CalcError::InvalidNumber(field))
}

/// Parse a numeric field, treating blanks, garbage and NaN as absent.
pub(crate) fn parse_optional(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}
