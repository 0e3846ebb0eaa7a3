//! Risk thresholds used by the position calculator and its warnings.

use serde::{Deserialize, Serialize};

/// Configuration for position sizing and risk warnings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Risk per trade above this percentage is flagged as aggressive
    pub max_risk_percent: f64,

    /// Reward/risk below this is flagged
    pub min_reward_ratio: f64,

    /// Reward/risk below this is flagged as low
    pub low_reward_ratio: f64,

    /// Position notional above this fraction of balance is flagged (0.0 to 1.0)
    pub large_position_fraction: f64,

    /// Leverage at or above this is elevated risk
    pub elevated_leverage: f64,

    /// Leverage at or above this is high risk
    pub high_leverage: f64,

    /// Leverage at or above this is extreme risk
    pub extreme_leverage: f64,

    /// Liquidation closer than this percentage to entry is flagged
    pub liquidation_buffer_percent: f64,

    /// Holding period used for the funding estimate
    pub funding_hours: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_risk_percent: 2.0,         // 2% rule
            min_reward_ratio: 2.0,         // 2:1
            low_reward_ratio: 1.5,         // 1.5:1
            large_position_fraction: 0.5,  // Half the account
            elevated_leverage: 5.0,
            high_leverage: 10.0,
            extreme_leverage: 20.0,
            liquidation_buffer_percent: 5.0,
            funding_hours: 24.0,           // One day of funding
        }
    }
}
