//! Single-candle pattern classification.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::Candle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bias {
    Bullish,
    Bearish,
    Neutral,
}

impl Bias {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bias::Bullish => "bullish",
            Bias::Bearish => "bearish",
            Bias::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandlePattern {
    DragonflyDoji,
    GravestoneDoji,
    Doji,
    Hammer,
    HangingMan,
    InvertedHammer,
    ShootingStar,
    BullishMarubozu,
    BearishMarubozu,
    SpinningTop,
    BullishCandle,
    BearishCandle,
}

impl CandlePattern {
    pub fn name(&self) -> &'static str {
        match self {
            CandlePattern::DragonflyDoji => "Dragonfly Doji",
            CandlePattern::GravestoneDoji => "Gravestone Doji",
            CandlePattern::Doji => "Doji",
            CandlePattern::Hammer => "Hammer (Bullish)",
            CandlePattern::HangingMan => "Hanging Man (Bearish)",
            CandlePattern::InvertedHammer => "Inverted Hammer",
            CandlePattern::ShootingStar => "Shooting Star (Bearish)",
            CandlePattern::BullishMarubozu => "Bullish Marubozu",
            CandlePattern::BearishMarubozu => "Bearish Marubozu",
            CandlePattern::SpinningTop => "Spinning Top (Indecision)",
            CandlePattern::BullishCandle => "Bullish Candle",
            CandlePattern::BearishCandle => "Bearish Candle",
        }
    }

    pub fn bias(&self) -> Bias {
        match self {
            CandlePattern::Hammer
            | CandlePattern::InvertedHammer
            | CandlePattern::BullishMarubozu
            | CandlePattern::BullishCandle => Bias::Bullish,
            CandlePattern::HangingMan
            | CandlePattern::ShootingStar
            | CandlePattern::BearishMarubozu
            | CandlePattern::BearishCandle => Bias::Bearish,
            CandlePattern::DragonflyDoji
            | CandlePattern::GravestoneDoji
            | CandlePattern::Doji
            | CandlePattern::SpinningTop => Bias::Neutral,
        }
    }
}

impl fmt::Display for CandlePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify a candle by body and wick proportions. First matching rule wins.
///
/// Note the doji naming: a long *upper* wick over a tiny body is labelled
/// Dragonfly here, and a long lower wick Gravestone.
pub fn identify_pattern(candle: &Candle) -> CandlePattern {
    let body = candle.body();
    let body_percent = candle.body_percent();
    let upper = candle.upper_wick();
    let lower = candle.lower_wick();
    let bullish = candle.is_bullish();

    if body_percent < 5.0 {
        if upper > body * 3.0 && lower < body {
            return CandlePattern::DragonflyDoji;
        }
        if lower > body * 3.0 && upper < body {
            return CandlePattern::GravestoneDoji;
        }
        return CandlePattern::Doji;
    }

    if lower > body * 2.0 && upper < body * 0.3 {
        return if bullish { CandlePattern::Hammer } else { CandlePattern::HangingMan };
    }

    if upper > body * 2.0 && lower < body * 0.3 {
        return if bullish { CandlePattern::InvertedHammer } else { CandlePattern::ShootingStar };
    }

    if body_percent > 90.0 {
        return if bullish { CandlePattern::BullishMarubozu } else { CandlePattern::BearishMarubozu };
    }

    if body_percent < 30.0 && upper > body && lower > body {
        return CandlePattern::SpinningTop;
    }

    if bullish {
        CandlePattern::BullishCandle
    } else {
        CandlePattern::BearishCandle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle::from_ohlc(open, high, low, close, 0.0)
    }

    #[test]
    fn test_doji_family() {
        assert_eq!(identify_pattern(&c(100.0, 105.0, 95.0, 100.2)), CandlePattern::Doji);
        // Zero range yields body% 0
        assert_eq!(identify_pattern(&c(100.0, 100.0, 100.0, 100.0)), CandlePattern::Doji);
        // Long upper wick, tiny lower wick
        assert_eq!(identify_pattern(&c(100.0, 110.0, 99.9, 100.3)), CandlePattern::DragonflyDoji);
        assert_eq!(identify_pattern(&c(100.3, 100.4, 90.0, 100.0)), CandlePattern::GravestoneDoji);
    }

    #[test]
    fn test_hammer_and_hanging_man() {
        assert_eq!(identify_pattern(&c(100.0, 102.1, 90.0, 102.0)), CandlePattern::Hammer);
        assert_eq!(identify_pattern(&c(102.0, 102.1, 90.0, 100.0)), CandlePattern::HangingMan);
    }

    #[test]
    fn test_inverted_hammer_and_shooting_star() {
        assert_eq!(identify_pattern(&c(100.0, 110.0, 99.9, 102.0)), CandlePattern::InvertedHammer);
        assert_eq!(identify_pattern(&c(102.0, 110.0, 99.9, 100.0)), CandlePattern::ShootingStar);
    }

    #[test]
    fn test_marubozu_spinning_top_default() {
        assert_eq!(identify_pattern(&c(100.0, 110.2, 99.9, 110.0)), CandlePattern::BullishMarubozu);
        assert_eq!(identify_pattern(&c(110.0, 110.1, 99.8, 100.0)), CandlePattern::BearishMarubozu);
        assert_eq!(identify_pattern(&c(100.0, 104.0, 96.0, 101.0)), CandlePattern::SpinningTop);
        assert_eq!(identify_pattern(&c(100.0, 108.0, 98.0, 106.0)), CandlePattern::BullishCandle);
        assert_eq!(CandlePattern::ShootingStar.bias(), Bias::Bearish);
    }
}
