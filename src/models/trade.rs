//! Journal trade record and its P&L arithmetic.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
        }
    }

    /// +1 for long, -1 for short.
    pub fn sign(&self) -> Decimal {
        match self {
            Direction::Long => Decimal::ONE,
            Direction::Short => Decimal::NEGATIVE_ONE,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "long" | "buy" => Ok(Self::Long),
            "short" | "sell" => Ok(Self::Short),
            other => Err(format!("unknown direction: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Open,
    Closed,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Open => "open",
            TradeStatus::Closed => "closed",
        }
    }
}

impl FromStr for TradeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            other => Err(format!("unknown trade status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeOutcome {
    Win,
    Loss,
    Pending,
}

impl TradeOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeOutcome::Win => "win",
            TradeOutcome::Loss => "loss",
            TradeOutcome::Pending => "pending",
        }
    }

    /// Strictly positive P&L wins; a flat close counts as a loss.
    pub fn from_pnl(pnl: Decimal) -> Self {
        if pnl > Decimal::ZERO {
            TradeOutcome::Win
        } else {
            TradeOutcome::Loss
        }
    }
}

impl FromStr for TradeOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "win" => Ok(Self::Win),
            "loss" => Ok(Self::Loss),
            "pending" => Ok(Self::Pending),
            other => Err(format!("unknown trade outcome: {other}")),
        }
    }
}

/// Unit the entered quantity is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum QuantityType {
    /// Base asset units (ETH in ETH/USDT)
    #[default]
    Base,
    /// Quote currency amount (USDT in ETH/USDT)
    Quote,
}

impl QuantityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuantityType::Base => "base",
            QuantityType::Quote => "quote",
        }
    }
}

impl FromStr for QuantityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "base" => Ok(Self::Base),
            "quote" => Ok(Self::Quote),
            other => Err(format!("unknown quantity type: {other}")),
        }
    }
}

/// Realized result of closing a position at some price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pnl {
    pub amount: Decimal,
    /// Price move in percent, multiplied by leverage
    pub percent: Decimal,
}

/// One journal entry, owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,

    /// Owner identity (email)
    pub user_id: String,

    /// Trading pair as `BASE/QUOTE`
    pub pair: String,

    pub direction: Direction,

    pub entry_price: Decimal,

    pub exit_price: Option<Decimal>,

    /// Quantity as entered, in the unit given by `quantity_type`
    pub quantity: Decimal,

    #[serde(default)]
    pub quantity_type: QuantityType,

    pub entry_date: DateTime<Utc>,

    pub exit_date: Option<DateTime<Utc>>,

    pub stop_loss: Option<Decimal>,

    pub take_profit: Option<Decimal>,

    pub leverage: u32,

    /// Exchange id from the exchange table
    pub exchange: String,

    pub status: TradeStatus,

    pub outcome: TradeOutcome,

    /// Realized P&L in quote currency, zero while open
    pub profit_loss: Decimal,

    pub profit_loss_percent: Decimal,

    #[serde(default)]
    pub fees: Decimal,

    #[serde(default)]
    pub notes: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub screenshots: Vec<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Trade {
    pub fn is_open(&self) -> bool {
        self.status == TradeStatus::Open
    }

    /// Position size in base units, converting a quote-denominated quantity at the entry price.
    /// `None` when the conversion overflows.
    pub fn base_quantity(&self) -> Option<Decimal> {
        base_quantity(self.quantity, self.quantity_type, self.entry_price)
    }

    /// P&L if the position were closed at `exit_price`, or `None` on overflow.
    pub fn pnl_at(&self, exit_price: Decimal) -> Option<Pnl> {
        compute_pnl(
            self.direction,
            self.entry_price,
            exit_price,
            self.base_quantity()?,
            self.leverage,
        )
    }

    /// Mark the trade closed at `exit_price`, filling P&L and outcome.
    /// Leaves the trade untouched and returns `None` when the P&L overflows.
    pub fn settle(&mut self, exit_price: Decimal, exit_date: DateTime<Utc>) -> Option<Pnl> {
        let pnl = self.pnl_at(exit_price)?;
        self.exit_price = Some(exit_price);
        self.exit_date = Some(exit_date);
        self.status = TradeStatus::Closed;
        self.outcome = TradeOutcome::from_pnl(pnl.amount);
        self.profit_loss = pnl.amount;
        self.profit_loss_percent = pnl.percent;
        Some(pnl)
    }

    /// Base currency of the pair (`ETH` for `ETH/USDT`).
    pub fn base_currency(&self) -> &str {
        self.pair.split('/').next().unwrap_or(&self.pair)
    }

    /// Quote currency of the pair (`USDT` for `ETH/USDT`), the whole pair when it has no `/`.
    pub fn quote_currency(&self) -> &str {
        self.pair.split_once('/').map(|(_, quote)| quote.trim()).unwrap_or(&self.pair)
    }
}

pub fn base_quantity(
    quantity: Decimal,
    quantity_type: QuantityType,
    entry_price: Decimal,
) -> Option<Decimal> {
    match quantity_type {
        QuantityType::Base => Some(quantity),
        QuantityType::Quote if entry_price.is_zero() => Some(Decimal::ZERO),
        QuantityType::Quote => quantity.checked_div(entry_price),
    }
}

/// Signed P&L for a move from `entry` to `exit` on `base_qty` units.
/// Returns `None` if any step leaves the `Decimal` range.
pub fn compute_pnl(
    direction: Direction,
    entry: Decimal,
    exit: Decimal,
    base_qty: Decimal,
    leverage: u32,
) -> Option<Pnl> {
    let signed_move = exit.checked_sub(entry)?.checked_mul(direction.sign())?;
    let percent = if entry.is_zero() {
        Decimal::ZERO
    } else {
        signed_move
            .checked_mul(Decimal::ONE_HUNDRED)?
            .checked_mul(Decimal::from(leverage))?
            .checked_div(entry)?
    };

    Some(Pnl {
        amount: signed_move.checked_mul(base_qty)?,
        percent,
    })
}

/// Fields supplied when recording a new trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTrade {
    pub pair: String,
    pub direction: Direction,
    pub entry_price: Decimal,
    pub exit_price: Option<Decimal>,
    pub quantity: Decimal,
    pub quantity_type: QuantityType,
    pub entry_date: DateTime<Utc>,
    pub exit_date: Option<DateTime<Utc>>,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub leverage: u32,
    pub exchange: String,
    pub fees: Decimal,
    pub notes: String,
    pub tags: Vec<String>,
    pub screenshots: Vec<String>,
}

impl NewTrade {
    /// Minimal open trade with defaults for everything optional.
    pub fn new(pair: &str, direction: Direction, entry_price: Decimal, quantity: Decimal) -> Self {
        Self {
            pair: pair.to_string(),
            direction,
            entry_price,
            exit_price: None,
            quantity,
            quantity_type: QuantityType::Base,
            entry_date: Utc::now(),
            exit_date: None,
            stop_loss: None,
            take_profit: None,
            leverage: 1,
            exchange: crate::exchange::DEFAULT_EXCHANGE.to_string(),
            fees: Decimal::ZERO,
            notes: String::new(),
            tags: Vec::new(),
            screenshots: Vec::new(),
        }
    }
}

/// Partial edit of a trade; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradePatch {
    pub pair: Option<String>,
    pub direction: Option<Direction>,
    pub entry_price: Option<Decimal>,
    pub exit_price: Option<Decimal>,
    pub quantity: Option<Decimal>,
    pub quantity_type: Option<QuantityType>,
    pub entry_date: Option<DateTime<Utc>>,
    pub exit_date: Option<DateTime<Utc>>,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub leverage: Option<u32>,
    pub exchange: Option<String>,
    pub fees: Option<Decimal>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl TradePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Copy every set field onto `trade`.
    pub fn apply(self, trade: &mut Trade) {
        if let Some(v) = self.pair {
            trade.pair = v;
        }
        if let Some(v) = self.direction {
            trade.direction = v;
        }
        if let Some(v) = self.entry_price {
            trade.entry_price = v;
        }
        if let Some(v) = self.exit_price {
            trade.exit_price = Some(v);
        }
        if let Some(v) = self.quantity {
            trade.quantity = v;
        }
        if let Some(v) = self.quantity_type {
            trade.quantity_type = v;
        }
        if let Some(v) = self.entry_date {
            trade.entry_date = v;
        }
        if let Some(v) = self.exit_date {
            trade.exit_date = Some(v);
        }
        if let Some(v) = self.stop_loss {
            trade.stop_loss = Some(v);
        }
        if let Some(v) = self.take_profit {
            trade.take_profit = Some(v);
        }
        if let Some(v) = self.leverage {
            trade.leverage = v;
        }
        if let Some(v) = self.exchange {
            trade.exchange = v;
        }
        if let Some(v) = self.fees {
            trade.fees = v;
        }
        if let Some(v) = self.notes {
            trade.notes = v;
        }
        if let Some(v) = self.tags {
            trade.tags = v;
        }
    }
}

/// Split a comma-separated tag list, dropping blanks.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn open_trade(direction: Direction) -> Trade {
        let now = Utc::now();
        Trade {
            id: "t1".to_string(),
            user_id: "alice@example.com".to_string(),
            pair: "ETH/USDT".to_string(),
            direction,
            entry_price: dec!(3000),
            exit_price: None,
            quantity: dec!(2),
            quantity_type: QuantityType::Base,
            entry_date: now,
            exit_date: None,
            stop_loss: None,
            take_profit: None,
            leverage: 5,
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

    #[test]
    fn test_pnl_long() {
        let trade = open_trade(Direction::Long);
        let pnl = trade.pnl_at(dec!(3300)).unwrap();
        assert_eq!(pnl.amount, dec!(600));
        // 10% move at 5x
        assert_eq!(pnl.percent, dec!(50));
    }

    #[test]
    fn test_pnl_short() {
        let trade = open_trade(Direction::Short);
        let pnl = trade.pnl_at(dec!(3300)).unwrap();
        assert_eq!(pnl.amount, dec!(-600));
        assert_eq!(pnl.percent, dec!(-50));
    }

    #[test]
    fn test_quote_quantity_converts_to_base() {
        let mut trade = open_trade(Direction::Long);
        trade.quantity = dec!(1500);
        trade.quantity_type = QuantityType::Quote;
        assert_eq!(trade.base_quantity(), Some(dec!(0.5)));
        assert_eq!(trade.pnl_at(dec!(3100)).unwrap().amount, dec!(50));
    }

    #[test]
    fn test_settle_flat_is_loss() {
        let mut trade = open_trade(Direction::Long);
        assert!(trade.settle(dec!(3000), Utc::now()).is_some());
        assert_eq!(trade.status, TradeStatus::Closed);
        assert_eq!(trade.outcome, TradeOutcome::Loss);
        assert_eq!(trade.profit_loss, Decimal::ZERO);
    }

    #[test]
    fn test_pnl_out_of_range_is_none() {
        let mut trade = open_trade(Direction::Long);
        trade.entry_price = dec!(1000000000000000);
        trade.quantity = dec!(1000000000000000);
        trade.leverage = 1;

        assert!(trade.pnl_at(dec!(2000000000000000)).is_none());
        assert!(trade.settle(dec!(2000000000000000), Utc::now()).is_none());
        assert_eq!(trade.status, TradeStatus::Open);
        assert_eq!(trade.exit_price, None);

        assert!(base_quantity(Decimal::MAX, QuantityType::Quote, dec!(0.0001)).is_none());
    }

    #[test]
    fn test_patch_applies_only_set_fields() {
        let mut trade = open_trade(Direction::Long);
        let patch = TradePatch {
            notes: Some("moved stop".to_string()),
            stop_loss: Some(dec!(2900)),
            ..Default::default()
        };
        assert!(!patch.is_empty());
        patch.apply(&mut trade);
        assert_eq!(trade.notes, "moved stop");
        assert_eq!(trade.stop_loss, Some(dec!(2900)));
        assert_eq!(trade.entry_price, dec!(3000));
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!(parse_tags(" breakout, ,trend ,"), vec!["breakout", "trend"]);
        assert!(parse_tags("").is_empty());
    }
}
