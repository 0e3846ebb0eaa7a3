//! Per-exchange fee schedules, leverage caps and maintenance-margin tiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of account a position is opened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Spot,
    Futures,
    Margin,
}

impl AccountType {
    pub const ALL: [AccountType; 3] = [AccountType::Spot, AccountType::Futures, AccountType::Margin];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Spot => "spot",
            AccountType::Futures => "futures",
            AccountType::Margin => "margin",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "spot" => Ok(Self::Spot),
            "futures" | "perp" | "perpetual" => Ok(Self::Futures),
            "margin" => Ok(Self::Margin),
            other => Err(format!("unknown account type: {other}")),
        }
    }
}

/// Fee percentages for one account type (0.05 means 0.05%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExchangeFees {
    pub maker: f64,
    pub taker: f64,
    /// Typical funding rate per funding interval (perpetuals only)
    pub funding: f64,
}

impl ExchangeFees {
    pub const fn new(maker: f64, taker: f64, funding: f64) -> Self {
        Self { maker, taker, funding }
    }

    /// Taker fee as a fraction (0.05% -> 0.0005).
    pub fn taker_fraction(&self) -> f64 {
        self.taker / 100.0
    }
}

/// A value held separately for each account type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerAccount<T> {
    pub spot: T,
    pub futures: T,
    pub margin: T,
}

impl<T: Copy> PerAccount<T> {
    pub const fn new(spot: T, futures: T, margin: T) -> Self {
        Self { spot, futures, margin }
    }

    pub fn get(&self, account_type: AccountType) -> T {
        match account_type {
            AccountType::Spot => self.spot,
            AccountType::Futures => self.futures,
            AccountType::Margin => self.margin,
        }
    }
}

/// Maintenance-margin bracket: positions up to `max_leverage` use `maintenance_margin_rate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeverageTier {
    pub max_leverage: u32,
    /// Percentage of notional (0.5 means 0.5%)
    pub maintenance_margin_rate: f64,
    pub description: String,
}

impl LeverageTier {
    pub fn new(max_leverage: u32, maintenance_margin_rate: f64, description: &str) -> Self {
        Self {
            max_leverage,
            maintenance_margin_rate,
            description: description.to_string(),
        }
    }
}

/// Static parameters of one exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeConfig {
    pub id: String,
    pub name: String,
    pub display_name: String,

    /// Which account types the venue offers
    pub account_types: PerAccount<bool>,

    pub fees: PerAccount<ExchangeFees>,

    pub max_leverage: PerAccount<u32>,

    /// Ascending by `max_leverage`; the last tier is the ceiling
    pub leverage_tiers: Vec<LeverageTier>,

    /// Minimum order value in quote currency
    pub min_trade_amount: f64,

    /// Hours between funding payments, 0 when the venue has no funding
    pub funding_interval: u32,

    pub website: String,
    #[serde(default)]
    pub fee_schedule_url: Option<String>,
}

impl ExchangeConfig {
    pub fn fees(&self, account_type: AccountType) -> ExchangeFees {
        self.fees.get(account_type)
    }

    pub fn max_leverage(&self, account_type: AccountType) -> u32 {
        self.max_leverage.get(account_type)
    }

    pub fn supports(&self, account_type: AccountType) -> bool {
        self.account_types.get(account_type)
    }

    pub fn available_account_types(&self) -> Vec<AccountType> {
        AccountType::ALL
            .into_iter()
            .filter(|a| self.supports(*a))
            .collect()
    }

    /// Maintenance-margin rate (%) for a leverage, clamped to the top tier.
    pub fn maintenance_margin_rate(&self, leverage: f64) -> f64 {
        self.leverage_tiers
            .iter()
            .find(|tier| leverage <= tier.max_leverage as f64)
            .or_else(|| self.leverage_tiers.last())
            .map(|tier| tier.maintenance_margin_rate)
            .unwrap_or(0.0)
    }

    /// Funding paid on `notional` over `hours_held`; only futures accrue funding.
    pub fn funding_cost(&self, account_type: AccountType, notional: f64, hours_held: f64) -> f64 {
        if account_type != AccountType::Futures || self.funding_interval == 0 {
            return 0.0;
        }

        let payments = (hours_held / self.funding_interval as f64).floor();
        notional * (self.fees(account_type).funding / 100.0) * payments
    }
}
