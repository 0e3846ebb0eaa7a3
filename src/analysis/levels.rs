//! Key price levels: support/resistance from two candles and Fibonacci retracements.

use serde::{Deserialize, Serialize};

use crate::models::OhlcvSnapshot;

/// Retracement ratios between the low (0%) and the high (100%).
pub const FIBONACCI_RATIOS: [f64; 7] = [0.0, 0.236, 0.382, 0.5, 0.618, 0.786, 1.0];

/// Psychological levels sit on multiples of this step.
const ROUND_LEVEL_STEP: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelStrength {
    Strong,
    Moderate,
}

impl LevelStrength {
    pub fn as_str(&self) -> &'static str {
        match self {
            LevelStrength::Strong => "strong",
            LevelStrength::Moderate => "moderate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyLevel {
    pub price: f64,
    pub strength: LevelStrength,
    pub touches: u32,
}

/// Support below and resistance above the current close.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Levels {
    /// Nearest first (descending)
    pub support: Vec<f64>,
    /// Nearest first (ascending)
    pub resistance: Vec<f64>,
}

impl Levels {
    pub fn support_levels(&self) -> Vec<KeyLevel> {
        rank(&self.support)
    }

    pub fn resistance_levels(&self) -> Vec<KeyLevel> {
        rank(&self.resistance)
    }
}

/// The nearest level is treated as the strongest.
fn rank(prices: &[f64]) -> Vec<KeyLevel> {
    prices
        .iter()
        .enumerate()
        .map(|(i, &price)| KeyLevel {
            price,
            strength: if i == 0 { LevelStrength::Strong } else { LevelStrength::Moderate },
            touches: i as u32 + 2,
        })
        .collect()
}

/// Derive support and resistance from the previous candle's extremes, the
/// nearest round number and the two-candle range.
pub fn support_resistance(snapshot: &OhlcvSnapshot) -> Levels {
    let close = snapshot.current.close;
    let mut support = vec![snapshot.previous.low];
    let mut resistance = vec![snapshot.previous.high];

    let round = (close / ROUND_LEVEL_STEP).round() * ROUND_LEVEL_STEP;
    if round > close {
        resistance.push(round);
    } else {
        support.push(round);
    }

    if snapshot.high_low.high > close {
        resistance.push(snapshot.high_low.high);
    }
    if snapshot.high_low.low < close {
        support.push(snapshot.high_low.low);
    }

    support.sort_by(|a, b| b.total_cmp(a));
    support.dedup();
    resistance.sort_by(|a, b| a.total_cmp(b));
    resistance.dedup();

    Levels { support, resistance }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FibLevel {
    pub ratio: f64,
    pub price: f64,
}

impl FibLevel {
    /// `"61.8%"`
    pub fn label(&self) -> String {
        format!("{}%", (self.ratio * 1000.0).round() / 10.0)
    }
}

/// Retracement levels from `low` up to `high`, 0% first.
pub fn fibonacci_levels(high: f64, low: f64) -> Vec<FibLevel> {
    let diff = high - low;
    FIBONACCI_RATIOS
        .iter()
        .map(|&ratio| FibLevel {
            ratio,
            price: if ratio >= 1.0 { high } else { low + diff * ratio },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Candle, Interval};

    fn snapshot(previous: Candle, current: Candle) -> OhlcvSnapshot {
        OhlcvSnapshot::from_candles("BTC/USDT", Interval::OneHour, previous, current)
    }

    #[test]
    fn test_support_resistance() {
        let previous = Candle::from_ohlc(43_000.0, 43_500.0, 42_800.0, 43_200.0, 10.0);
        let current = Candle::from_ohlc(43_200.0, 43_650.0, 43_100.0, 43_420.0, 12.0);
        let levels = support_resistance(&snapshot(previous, current));

        // 43_420 rounds down to 43_400, which becomes support
        assert_eq!(levels.support, vec![43_400.0, 42_800.0]);
        assert_eq!(levels.resistance, vec![43_500.0, 43_650.0]);

        let ranked = levels.support_levels();
        assert_eq!(ranked[0].strength, LevelStrength::Strong);
        assert_eq!(ranked[0].touches, 2);
        assert_eq!(ranked[1].strength, LevelStrength::Moderate);
        assert_eq!(ranked[1].touches, 3);
    }

    #[test]
    fn test_round_level_above_close_is_resistance() {
        let previous = Candle::from_ohlc(3_400.0, 3_480.0, 3_390.0, 3_450.0, 10.0);
        let current = Candle::from_ohlc(3_450.0, 3_470.0, 3_440.0, 3_460.0, 10.0);
        let levels = support_resistance(&snapshot(previous, current));

        assert_eq!(levels.resistance, vec![3_480.0, 3_500.0]);
        assert_eq!(levels.support, vec![3_390.0]);
    }

    #[test]
    fn test_duplicates_collapse() {
        let previous = Candle::from_ohlc(100.0, 120.0, 90.0, 110.0, 1.0);
        let current = Candle::from_ohlc(110.0, 115.0, 95.0, 112.0, 1.0);
        let levels = support_resistance(&snapshot(previous, current));

        // Previous extremes are also the two-candle extremes
        assert_eq!(levels.resistance, vec![120.0]);
        assert_eq!(levels.support, vec![100.0, 90.0]);
    }

    #[test]
    fn test_fibonacci_levels() {
        let fib = fibonacci_levels(200.0, 100.0);
        assert_eq!(fib.len(), 7);
        assert_eq!(fib[0].price, 100.0);
        assert!((fib[1].price - 123.6).abs() < 1e-9);
        assert!((fib[4].price - 161.8).abs() < 1e-9);
        assert_eq!(fib[6].price, 200.0);
        assert_eq!(fib[4].label(), "61.8%");
        assert_eq!(fib[3].label(), "50%");
    }
}
