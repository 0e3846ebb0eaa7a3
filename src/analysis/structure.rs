//! Market structure: trend from consecutive highs/lows and position inside the range.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::OhlcvSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Uptrend,
    Downtrend,
    Expansion,
    Range,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Uptrend => "UPTREND",
            Trend::Downtrend => "DOWNTREND",
            Trend::Expansion => "EXPANSION",
            Trend::Range => "RANGE",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Trend::Uptrend => "Higher Highs and Higher Lows",
            Trend::Downtrend => "Lower Highs and Lower Lows",
            Trend::Expansion => "Range is expanding - high volatility",
            Trend::Range => "Market consolidating between support and resistance",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeZone {
    NearHigh,
    NearLow,
    Middle,
}

impl RangeZone {
    /// Classify a 0-100 position; `None` outside the three marked bands.
    pub fn from_position(position: f64) -> Option<Self> {
        if position > 80.0 {
            Some(RangeZone::NearHigh)
        } else if position < 20.0 {
            Some(RangeZone::NearLow)
        } else if position > 40.0 && position < 60.0 {
            Some(RangeZone::Middle)
        } else {
            None
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RangeZone::NearHigh => "Near range high - potential resistance",
            RangeZone::NearLow => "Near range low - potential support",
            RangeZone::Middle => "Middle of range - good for range trading",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StructureRead {
    pub trend: Trend,
    /// Percent of the way from `low` to `high`; `None` for a zero-width range
    pub range_position: Option<f64>,
    pub zone: Option<RangeZone>,
}

/// Compare the current extremes with the previous candle's and locate `current` within `low..high`.
pub fn analyze_structure(current: f64, high: f64, low: f64, prev_high: f64, prev_low: f64) -> StructureRead {
    let trend = if high > prev_high && low > prev_low {
        Trend::Uptrend
    } else if high < prev_high && low < prev_low {
        Trend::Downtrend
    } else if high > prev_high && low < prev_low {
        Trend::Expansion
    } else {
        Trend::Range
    };

    let range = high - low;
    let range_position = (range > 0.0).then(|| (current - low) / range * 100.0);

    StructureRead {
        trend,
        range_position,
        zone: range_position.and_then(RangeZone::from_position),
    }
}

/// Structure of the current candle against the previous one.
pub fn snapshot_structure(snapshot: &OhlcvSnapshot) -> StructureRead {
    analyze_structure(
        snapshot.current.close,
        snapshot.current.high,
        snapshot.current.low,
        snapshot.previous.high,
        snapshot.previous.low,
    )
}
