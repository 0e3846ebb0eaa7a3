//! Registry of exchange parameters, built once and passed by reference.

use thiserror::Error;

use super::config::{AccountType, ExchangeConfig, ExchangeFees, LeverageTier, PerAccount};

/// Id of the venue used when a lookup misses.
pub const DEFAULT_EXCHANGE: &str = "binance";

#[derive(Debug, Error, PartialEq)]
pub enum ExchangeTableError {
    #[error("exchange table is empty")]
    Empty,

    #[error("default exchange '{0}' is not in the table")]
    MissingDefault(String),

    #[error("exchange '{0}' has no leverage tiers")]
    NoTiers(String),

    #[error("exchange '{0}' leverage tiers are not ascending")]
    UnsortedTiers(String),

    #[error("exchange '{0}' is listed twice")]
    Duplicate(String),
}

/// Read-only lookup of exchange parameters.
///
/// Unknown ids resolve to the default exchange instead of failing.
#[derive(Debug, Clone)]
pub struct ExchangeTable {
    exchanges: Vec<ExchangeConfig>,
    default_index: usize,
}

impl ExchangeTable {
    /// Build a table from explicit configs, checking tier ordering.
    pub fn new(exchanges: Vec<ExchangeConfig>, default_id: &str) -> Result<Self, ExchangeTableError> {
        if exchanges.is_empty() {
            return Err(ExchangeTableError::Empty);
        }

        for (i, exchange) in exchanges.iter().enumerate() {
            if exchanges[..i].iter().any(|e| e.id == exchange.id) {
                return Err(ExchangeTableError::Duplicate(exchange.id.clone()));
            }
            if exchange.leverage_tiers.is_empty() {
                return Err(ExchangeTableError::NoTiers(exchange.id.clone()));
            }
            let ascending = exchange
                .leverage_tiers
                .windows(2)
                .all(|w| w[0].max_leverage < w[1].max_leverage);
            if !ascending {
                return Err(ExchangeTableError::UnsortedTiers(exchange.id.clone()));
            }
        }

        let default_index = exchanges
            .iter()
            .position(|e| e.id == default_id)
            .ok_or_else(|| ExchangeTableError::MissingDefault(default_id.to_string()))?;

        Ok(Self {
            exchanges,
            default_index,
        })
    }

    /// The built-in venue list.
    pub fn builtin() -> Self {
        Self {
            exchanges: builtin_exchanges(),
            default_index: 0,
        }
    }

    /// Same venues as [`builtin`](Self::builtin) with a different fallback.
    pub fn builtin_with_default(default_id: &str) -> Result<Self, ExchangeTableError> {
        Self::new(builtin_exchanges(), default_id)
    }

    pub fn default_exchange(&self) -> &ExchangeConfig {
        &self.exchanges[self.default_index]
    }

    pub fn contains(&self, exchange_id: &str) -> bool {
        self.exchanges.iter().any(|e| e.id == exchange_id)
    }

    /// Config for `exchange_id`, or the default exchange when unknown.
    pub fn config(&self, exchange_id: &str) -> &ExchangeConfig {
        self.exchanges
            .iter()
            .find(|e| e.id == exchange_id)
            .unwrap_or_else(|| self.default_exchange())
    }

    pub fn fees(&self, exchange_id: &str, account_type: AccountType) -> ExchangeFees {
        self.config(exchange_id).fees(account_type)
    }

    pub fn max_leverage(&self, exchange_id: &str, account_type: AccountType) -> u32 {
        self.config(exchange_id).max_leverage(account_type)
    }

    pub fn maintenance_margin_rate(&self, exchange_id: &str, leverage: f64) -> f64 {
        self.config(exchange_id).maintenance_margin_rate(leverage)
    }

    pub fn funding_cost(
        &self,
        exchange_id: &str,
        account_type: AccountType,
        notional: f64,
        hours_held: f64,
    ) -> f64 {
        self.config(exchange_id)
            .funding_cost(account_type, notional, hours_held)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExchangeConfig> {
        self.exchanges.iter()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.exchanges.iter().map(|e| e.id.as_str()).collect()
    }
}

impl Default for ExchangeTable {
    fn default() -> Self {
        Self::builtin()
    }
}

struct VenueSpec {
    id: &'static str,
    name: &'static str,
    display_name: &'static str,
    account_types: PerAccount<bool>,
    fees: PerAccount<ExchangeFees>,
    max_leverage: PerAccount<u32>,
    tiers: &'static [(u32, f64, &'static str)],
    funding_interval: u32,
    website: &'static str,
    fee_schedule_url: &'static str,
}

impl VenueSpec {
    fn build(self) -> ExchangeConfig {
        ExchangeConfig {
            id: self.id.to_string(),
            name: self.name.to_string(),
            display_name: self.display_name.to_string(),
            account_types: self.account_types,
            fees: self.fees,
            max_leverage: self.max_leverage,
            leverage_tiers: self
                .tiers
                .iter()
                .map(|(max, rate, desc)| LeverageTier::new(*max, *rate, desc))
                .collect(),
            min_trade_amount: 10.0,
            funding_interval: self.funding_interval,
            website: self.website.to_string(),
            fee_schedule_url: Some(self.fee_schedule_url.to_string()),
        }
    }
}

const STANDARD_TIERS: &[(u32, f64, &str)] = &[
    (20, 0.5, "Low Risk"),
    (50, 1.0, "Medium Risk"),
    (125, 2.5, "High Risk"),
];

fn builtin_exchanges() -> Vec<ExchangeConfig> {
    let fee = ExchangeFees::new;

    vec![
        VenueSpec {
            id: "binance",
            name: "Binance",
            display_name: "Binance",
            account_types: PerAccount::new(true, true, true),
            fees: PerAccount::new(fee(0.1, 0.1, 0.01), fee(0.02, 0.05, 0.01), fee(0.1, 0.1, 0.0)),
            max_leverage: PerAccount::new(3, 125, 10),
            tiers: STANDARD_TIERS,
            funding_interval: 8,
            website: "https://www.binance.com",
            fee_schedule_url: "https://www.binance.com/en/fee/schedule",
        },
        VenueSpec {
            id: "bybit",
            name: "Bybit",
            display_name: "Bybit",
            account_types: PerAccount::new(true, true, false),
            fees: PerAccount::new(fee(0.1, 0.1, 0.0), fee(0.02, 0.055, 0.01), fee(0.1, 0.1, 0.0)),
            max_leverage: PerAccount::new(1, 100, 1),
            tiers: &[(25, 0.5, "Low Risk"), (50, 1.0, "Medium Risk"), (100, 2.5, "High Risk")],
            funding_interval: 8,
            website: "https://www.bybit.com",
            fee_schedule_url: "https://www.bybit.com/en/help-center/article/Trading-Fee-Structure",
        },
        VenueSpec {
            id: "kucoin",
            name: "KuCoin",
            display_name: "KuCoin",
            account_types: PerAccount::new(true, true, true),
            fees: PerAccount::new(fee(0.1, 0.1, 0.0), fee(0.02, 0.06, 0.01), fee(0.1, 0.1, 0.0)),
            max_leverage: PerAccount::new(10, 100, 10),
            tiers: &[(20, 0.5, "Low Risk"), (50, 1.0, "Medium Risk"), (100, 2.0, "High Risk")],
            funding_interval: 8,
            website: "https://www.kucoin.com",
            fee_schedule_url: "https://www.kucoin.com/vip/level",
        },
        VenueSpec {
            id: "coinbase",
            name: "Coinbase",
            display_name: "Coinbase",
            account_types: PerAccount::new(true, false, false),
            fees: PerAccount::new(fee(0.4, 0.6, 0.0), fee(0.0, 0.0, 0.0), fee(0.0, 0.0, 0.0)),
            // Spot only: no leverage anywhere
            max_leverage: PerAccount::new(1, 1, 1),
            tiers: &[(1, 0.0, "Spot Only")],
            funding_interval: 0,
            website: "https://www.coinbase.com",
            fee_schedule_url: "https://www.coinbase.com/advanced-fees",
        },
        VenueSpec {
            id: "okx",
            name: "OKX",
            display_name: "OKX",
            account_types: PerAccount::new(true, true, true),
            fees: PerAccount::new(fee(0.08, 0.1, 0.0), fee(0.02, 0.05, 0.01), fee(0.08, 0.1, 0.0)),
            max_leverage: PerAccount::new(10, 125, 10),
            tiers: &[(20, 0.5, "Low Risk"), (75, 1.0, "Medium Risk"), (125, 2.5, "High Risk")],
            funding_interval: 8,
            website: "https://www.okx.com",
            fee_schedule_url: "https://www.okx.com/fees",
        },
        VenueSpec {
            id: "kraken",
            name: "Kraken",
            display_name: "Kraken",
            account_types: PerAccount::new(true, true, true),
            fees: PerAccount::new(fee(0.16, 0.26, 0.0), fee(0.02, 0.05, 0.01), fee(0.16, 0.26, 0.02)),
            max_leverage: PerAccount::new(5, 50, 5),
            tiers: &[(10, 0.5, "Low Risk"), (25, 1.0, "Medium Risk"), (50, 2.0, "High Risk")],
            funding_interval: 8,
            website: "https://www.kraken.com",
            fee_schedule_url: "https://www.kraken.com/features/fee-schedule",
        },
        VenueSpec {
            id: "gateio",
            name: "Gate.io",
            display_name: "Gate.io",
            account_types: PerAccount::new(true, true, true),
            fees: PerAccount::new(fee(0.2, 0.2, 0.0), fee(0.015, 0.05, 0.01), fee(0.2, 0.2, 0.0)),
            max_leverage: PerAccount::new(10, 100, 10),
            tiers: &[(20, 0.5, "Low Risk"), (50, 1.0, "Medium Risk"), (100, 2.0, "High Risk")],
            funding_interval: 8,
            website: "https://www.gate.io",
            fee_schedule_url: "https://www.gate.io/fee",
        },
        VenueSpec {
            id: "htx",
            name: "HTX",
            display_name: "HTX (Huobi)",
            account_types: PerAccount::new(true, true, true),
            fees: PerAccount::new(fee(0.2, 0.2, 0.0), fee(0.02, 0.05, 0.01), fee(0.2, 0.2, 0.098)),
            max_leverage: PerAccount::new(10, 125, 5),
            tiers: &[(20, 0.5, "Low Risk"), (75, 1.0, "Medium Risk"), (125, 2.5, "High Risk")],
            funding_interval: 8,
            website: "https://www.htx.com",
            fee_schedule_url: "https://www.htx.com/support/fee",
        },
        VenueSpec {
            id: "bitget",
            name: "Bitget",
            display_name: "Bitget",
            account_types: PerAccount::new(true, true, true),
            fees: PerAccount::new(fee(0.1, 0.1, 0.0), fee(0.02, 0.06, 0.01), fee(0.1, 0.1, 0.0)),
            max_leverage: PerAccount::new(10, 125, 10),
            tiers: STANDARD_TIERS,
            funding_interval: 8,
            website: "https://www.bitget.com",
            fee_schedule_url: "https://www.bitget.com/fee",
        },
        VenueSpec {
            id: "mexc",
            name: "MEXC",
            display_name: "MEXC",
            account_types: PerAccount::new(true, true, true),
            fees: PerAccount::new(fee(0.0, 0.0, 0.0), fee(0.0, 0.01, 0.01), fee(0.0, 0.0, 0.0)),
            max_leverage: PerAccount::new(10, 200, 10),
            tiers: &[(25, 0.5, "Low Risk"), (100, 1.0, "Medium Risk"), (200, 5.0, "Very High Risk")],
            funding_interval: 8,
            website: "https://www.mexc.com",
            fee_schedule_url: "https://www.mexc.com/fee",
        },
    ]
    .into_iter()
    .map(VenueSpec::build)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_is_valid() {
        let table = ExchangeTable::new(builtin_exchanges(), DEFAULT_EXCHANGE);
        assert!(table.is_ok());
        assert_eq!(ExchangeTable::builtin().ids().len(), 10);
        assert_eq!(ExchangeTable::builtin().default_exchange().id, "binance");
    }

    #[test]
    fn test_unknown_exchange_falls_back_to_default() {
        let table = ExchangeTable::builtin();
        assert_eq!(table.config("nope").id, "binance");
        assert_eq!(table.fees("nope", AccountType::Futures).taker, 0.05);
    }

    #[test]
    fn test_coinbase_has_no_futures_leverage() {
        let table = ExchangeTable::builtin();
        assert_eq!(table.max_leverage("coinbase", AccountType::Futures), 1);
        assert_eq!(table.funding_cost("coinbase", AccountType::Futures, 10_000.0, 24.0), 0.0);
        assert_eq!(table.config("coinbase").available_account_types(), vec![AccountType::Spot]);
    }

    #[test]
    fn test_binance_lookups() {
        let table = ExchangeTable::builtin();
        assert_eq!(table.max_leverage("binance", AccountType::Futures), 125);
        assert_eq!(table.maintenance_margin_rate("binance", 10.0), 0.5);
        assert_eq!(table.maintenance_margin_rate("binance", 75.0), 2.5);
        assert_eq!(table.maintenance_margin_rate("mexc", 150.0), 5.0);
    }

    #[test]
    fn test_rejects_unsorted_tiers() {
        let mut venues = builtin_exchanges();
        venues[1].leverage_tiers.reverse();
        assert_eq!(
            ExchangeTable::new(venues, DEFAULT_EXCHANGE).unwrap_err(),
            ExchangeTableError::UnsortedTiers("bybit".to_string())
        );
    }

    #[test]
    fn test_rejects_missing_default_and_empty() {
        assert_eq!(
            ExchangeTable::new(builtin_exchanges(), "ftx").unwrap_err(),
            ExchangeTableError::MissingDefault("ftx".to_string())
        );
        assert_eq!(ExchangeTable::new(vec![], "binance").unwrap_err(), ExchangeTableError::Empty);
    }

    #[test]
    fn test_custom_default() {
        let table = ExchangeTable::builtin_with_default("kraken").unwrap();
        assert_eq!(table.config("unknown").id, "kraken");
        assert!(table.contains("okx"));
    }
}
