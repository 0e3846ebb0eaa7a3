//! Advisory checks on calculator inputs. Warnings never block a calculation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::Direction;
use super::calculator::{parse_optional, CalculationInput, CalculationResult, PositionCalculator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Caution,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Caution => "caution",
            Severity::High => "high",
            Severity::Critical => "critical",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    StopWrongSide,
    TakeProfitWrongSide,
    AggressiveRisk,
    LowRewardRatio,
    VeryLowRewardRatio,
    LargePosition,
    LeverageExceedsMax,
    ExtremeLeverage,
    HighLeverage,
    ElevatedLeverage,
    StopBeyondLiquidation,
    LiquidationTooClose,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    pub severity: Severity,
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    fn new(severity: Severity, kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            severity,
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

impl PositionCalculator<'_> {
    /// Collect warnings for `input`.
    ///
    /// Checks that need computed figures are skipped when `result` is `None`.
    /// Fields that fail to parse simply don't trigger their checks.
    pub fn validate(&self, input: &CalculationInput, result: Option<&CalculationResult>) -> Vec<Warning> {
        let config = self.config();
        let mut warnings = Vec::new();

        let entry = parse_optional(&input.entry_price);
        let stop = parse_optional(&input.stop_price);
        let first_target = input.take_profits.first().and_then(|raw| parse_optional(raw));
        let risk = parse_optional(&input.risk_percent);
        let balance = parse_optional(&input.account_balance);

        if let (Some(entry), Some(stop)) = (entry, stop) {
            let (stop_wrong, stop_msg) = match input.direction {
                Direction::Long => (stop >= entry, "For LONG positions, stop loss should be below entry price"),
                Direction::Short => (stop <= entry, "For SHORT positions, stop loss should be above entry price"),
            };
            if stop_wrong {
                warnings.push(Warning::new(Severity::Caution, WarningKind::StopWrongSide, stop_msg));
            }
        }

        if let (Some(entry), Some(target)) = (entry, first_target) {
            let (target_wrong, target_msg) = match input.direction {
                Direction::Long => (target <= entry, "For LONG positions, take profit should be above entry price"),
                Direction::Short => (target >= entry, "For SHORT positions, take profit should be below entry price"),
            };
            if target_wrong {
                warnings.push(Warning::new(Severity::Caution, WarningKind::TakeProfitWrongSide, target_msg));
            }
        }

        if risk.is_some_and(|r| r > config.max_risk_percent) {
            warnings.push(Warning::new(
                Severity::Caution,
                WarningKind::AggressiveRisk,
                format!("Risk per trade > {}% is considered aggressive", config.max_risk_percent),
            ));
        }

        if let Some(result) = result {
            let rr = result.reward_ratio;
            if rr > 0.0 && rr < config.min_reward_ratio {
                warnings.push(Warning::new(
                    Severity::Caution,
                    WarningKind::LowRewardRatio,
                    format!(
                        "Risk/Reward ratio below {}:1 - consider better entry/exit",
                        config.min_reward_ratio
                    ),
                ));
            }
            if rr > 0.0 && rr < config.low_reward_ratio {
                warnings.push(Warning::new(
                    Severity::High,
                    WarningKind::VeryLowRewardRatio,
                    format!(
                        "LOW R:R: Risk/reward ratio below 1:{}. Consider better TP target or tighter stop-loss",
                        config.low_reward_ratio
                    ),
                ));
            }

            if let Some(balance) = balance {
                if result.position_size > balance * config.large_position_fraction {
                    warnings.push(Warning::new(
                        Severity::Caution,
                        WarningKind::LargePosition,
                        format!(
                            "LARGE POSITION: This is {:.1}% of your account",
                            result.position_size / balance * 100.0
                        ),
                    ));
                }
            }
        }

        let leverage = match input.effective_leverage() {
            Ok(l) if input.use_leverage && l > 1.0 => l,
            _ => return warnings,
        };

        let max_leverage = self.exchanges().max_leverage(&input.exchange, input.account_type);
        if leverage > max_leverage as f64 {
            warnings.push(Warning::new(
                Severity::Critical,
                WarningKind::LeverageExceedsMax,
                format!(
                    "INVALID: {} {} max leverage is {}x",
                    input.exchange, input.account_type, max_leverage
                ),
            ));
        }

        if leverage >= config.extreme_leverage {
            warnings.push(Warning::new(
                Severity::Critical,
                WarningKind::ExtremeLeverage,
                format!(
                    "EXTREME RISK: Leverage >={}x can lead to instant liquidation",
                    config.extreme_leverage
                ),
            ));
        } else if leverage >= config.high_leverage {
            warnings.push(Warning::new(
                Severity::High,
                WarningKind::HighLeverage,
                format!("HIGH RISK: Leverage >={}x is extremely dangerous", config.high_leverage),
            ));
        } else if leverage >= config.elevated_leverage {
            warnings.push(Warning::new(
                Severity::Caution,
                WarningKind::ElevatedLeverage,
                format!(
                    "Leverage >={}x increases liquidation risk significantly",
                    config.elevated_leverage
                ),
            ));
        }

        let Some(result) = result else {
            return warnings;
        };

        if result.liquidation_price > 0.0 {
            let beyond = match (input.direction, stop) {
                (Direction::Long, Some(stop)) => stop < result.liquidation_price,
                (Direction::Short, Some(stop)) => stop > result.liquidation_price,
                _ => false,
            };
            if beyond {
                warnings.push(Warning::new(
                    Severity::Critical,
                    WarningKind::StopBeyondLiquidation,
                    "CRITICAL: Stop loss is beyond liquidation price - you'll be liquidated first!",
                ));
            }
        }

        let distance = result.distance_to_liquidation;
        if distance > 0.0 && distance < config.liquidation_buffer_percent {
            warnings.push(Warning::new(
                Severity::Critical,
                WarningKind::LiquidationTooClose,
                format!(
                    "DANGER: Liquidation price is within {}% of entry - very risky!",
                    config.liquidation_buffer_percent
                ),
            ));
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::{AccountType, ExchangeTable};
    use crate::trading::RiskConfig;

    fn kinds(warnings: &[Warning]) -> Vec<WarningKind> {
        warnings.iter().map(|w| w.kind).collect()
    }

    fn check(input: &CalculationInput) -> Vec<Warning> {
        let table = ExchangeTable::builtin();
        let calc = PositionCalculator::new(&table, RiskConfig::default());
        let result = calc.calculate(input).ok();
        calc.validate(input, result.as_ref())
    }

    #[test]
    fn test_clean_setup_has_no_warnings() {
        // 1% risk, 3:1 target, no leverage
        assert!(check(&CalculationInput::default()).is_empty());
    }

    #[test]
    fn test_wrong_side_stop_and_target() {
        let input = CalculationInput {
            stop_price: "3600".to_string(),
            take_profits: vec!["3300".to_string()],
            ..Default::default()
        };
        let k = kinds(&check(&input));
        assert!(k.contains(&WarningKind::StopWrongSide));
        assert!(k.contains(&WarningKind::TakeProfitWrongSide));
    }

    #[test]
    fn test_both_reward_ratio_warnings_fire() {
        let input = CalculationInput {
            take_profits: vec!["3600".to_string()],
            ..Default::default()
        };
        let k = kinds(&check(&input));
        assert!(k.contains(&WarningKind::LowRewardRatio));
        assert!(k.contains(&WarningKind::VeryLowRewardRatio));
    }

    #[test]
    fn test_aggressive_risk_and_large_position() {
        let input = CalculationInput {
            risk_percent: "3".to_string(),
            ..Default::default()
        };
        let warnings = check(&input);
        let k = kinds(&warnings);
        assert!(k.contains(&WarningKind::AggressiveRisk));
        assert!(k.contains(&WarningKind::LargePosition));
        let large = warnings.iter().find(|w| w.kind == WarningKind::LargePosition).unwrap();
        assert_eq!(large.message, "LARGE POSITION: This is 105.0% of your account");
    }

    #[test]
    fn test_coinbase_futures_leverage_is_invalid() {
        let input = CalculationInput {
            exchange: "coinbase".to_string(),
            account_type: AccountType::Futures,
            use_leverage: true,
            leverage: "3".to_string(),
            ..Default::default()
        };
        let warnings = check(&input);
        let invalid = warnings
            .iter()
            .find(|w| w.kind == WarningKind::LeverageExceedsMax)
            .unwrap();
        assert_eq!(invalid.severity, Severity::Critical);
        assert_eq!(invalid.message, "INVALID: coinbase futures max leverage is 1x");
    }

    #[test]
    fn test_exactly_one_leverage_tier() {
        for (lev, expected) in [
            ("5", WarningKind::ElevatedLeverage),
            ("10", WarningKind::HighLeverage),
            ("25", WarningKind::ExtremeLeverage),
        ] {
            let input = CalculationInput {
                use_leverage: true,
                leverage: lev.to_string(),
                stop_price: "3490".to_string(),
                take_profits: vec!["3600".to_string()],
                ..Default::default()
            };
            let k = kinds(&check(&input));
            let tiers: Vec<_> = k
                .iter()
                .filter(|w| {
                    matches!(
                        w,
                        WarningKind::ElevatedLeverage | WarningKind::HighLeverage | WarningKind::ExtremeLeverage
                    )
                })
                .collect();
            assert_eq!(tiers, vec![&expected]);
        }
    }

    #[test]
    fn test_stop_beyond_liquidation_and_close_liquidation() {
        // 25x long liquidates at 3360, stop at 3300 sits past it
        let input = CalculationInput {
            use_leverage: true,
            leverage: "25".to_string(),
            stop_price: "3300".to_string(),
            ..Default::default()
        };
        let k = kinds(&check(&input));
        assert!(k.contains(&WarningKind::StopBeyondLiquidation));
        assert!(k.contains(&WarningKind::LiquidationTooClose));
    }

    #[test]
    fn test_leverage_checks_skipped_when_disabled() {
        let input = CalculationInput {
            use_leverage: false,
            leverage: "100".to_string(),
            ..Default::default()
        };
        assert!(check(&input).is_empty());
    }
}
