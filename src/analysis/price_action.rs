//! Price-action read of a single candle plus volume conviction and entry hints.

use serde::{Deserialize, Serialize};

use crate::models::{Candle, OhlcvSnapshot};

/// Pattern flags raised by [`analyze_candle`]. Several can fire together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionPattern {
    Doji,
    Marubozu { bullish: bool },
    ShootingStar,
    Hammer,
    EngulfingCandidate { bullish: bool },
    SpinningTop,
}

impl ActionPattern {
    pub fn label(&self) -> &'static str {
        match self {
            ActionPattern::Doji => "Doji - Indecision in the market",
            ActionPattern::Marubozu { bullish: true } => "Strong Bullish Marubozu",
            ActionPattern::Marubozu { bullish: false } => "Strong Bearish Marubozu",
            ActionPattern::ShootingStar => "Shooting Star / Inverted Hammer",
            ActionPattern::Hammer => "Hammer / Hanging Man",
            ActionPattern::EngulfingCandidate { bullish: true } => "Bullish Engulfing Candidate",
            ActionPattern::EngulfingCandidate { bullish: false } => "Bearish Engulfing Candidate",
            ActionPattern::SpinningTop => "Spinning Top - High volatility and indecision",
        }
    }

    pub fn signal(&self) -> &'static str {
        match self {
            ActionPattern::Doji => "Potential reversal or continuation - wait for confirmation",
            ActionPattern::Marubozu { bullish: true } => "Strong buying pressure",
            ActionPattern::Marubozu { bullish: false } => "Strong selling pressure",
            ActionPattern::ShootingStar => "Potential bearish reversal - sellers rejected higher prices",
            ActionPattern::Hammer => "Potential bullish reversal - buyers rejected lower prices",
            ActionPattern::EngulfingCandidate { bullish: true } => "Strong bullish momentum",
            ActionPattern::EngulfingCandidate { bullish: false } => "Strong bearish momentum",
            ActionPattern::SpinningTop => "Market is uncertain - avoid trading or use tight stops",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandleRead {
    pub bullish: bool,
    pub body_percent: f64,
    pub upper_wick_percent: f64,
    pub lower_wick_percent: f64,
    pub patterns: Vec<ActionPattern>,
}

/// Flag every proportion-based pattern the candle matches. A zero-range candle matches none.
pub fn analyze_candle(candle: &Candle) -> CandleRead {
    let bullish = candle.is_bullish();
    let body = candle.body_percent();
    let upper = candle.upper_wick_percent();
    let lower = candle.lower_wick_percent();
    let mut patterns = Vec::new();

    if body < 10.0 && candle.range() > 0.0 {
        patterns.push(ActionPattern::Doji);
    }
    if body > 80.0 {
        patterns.push(ActionPattern::Marubozu { bullish });
    }
    if upper > 60.0 && body < 30.0 {
        patterns.push(ActionPattern::ShootingStar);
    }
    if lower > 60.0 && body < 30.0 {
        patterns.push(ActionPattern::Hammer);
    }
    if body > 50.0 && upper < 20.0 && lower < 20.0 {
        patterns.push(ActionPattern::EngulfingCandidate { bullish });
    }
    if upper > 40.0 && lower > 40.0 {
        patterns.push(ActionPattern::SpinningTop);
    }

    CandleRead {
        bullish,
        body_percent: body,
        upper_wick_percent: upper,
        lower_wick_percent: lower,
        patterns,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeBand {
    VeryHigh,
    AboveAverage,
    Average,
    Low,
}

impl VolumeBand {
    pub fn from_change_percent(change: f64) -> Self {
        if change > 50.0 {
            VolumeBand::VeryHigh
        } else if change > 20.0 {
            VolumeBand::AboveAverage
        } else if change < -20.0 {
            VolumeBand::Low
        } else {
            VolumeBand::Average
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            VolumeBand::VeryHigh => "Very high volume - strong conviction",
            VolumeBand::AboveAverage => "Above average volume - good participation",
            VolumeBand::Average => "Average volume - normal market activity",
            VolumeBand::Low => "Low volume - weak conviction",
        }
    }

    pub fn note(&self) -> Option<&'static str> {
        match self {
            VolumeBand::VeryHigh => Some("Price move is more reliable with high volume"),
            VolumeBand::Low => Some("Price move may lack follow-through"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeRead {
    /// 0 when the previous volume is 0
    pub change_percent: f64,
    pub band: VolumeBand,
}

pub fn analyze_volume(current: f64, previous: f64) -> VolumeRead {
    let change_percent = if previous > 0.0 {
        (current - previous) / previous * 100.0
    } else {
        0.0
    };
    VolumeRead {
        change_percent,
        band: VolumeBand::from_change_percent(change_percent),
    }
}

/// Combined read used by the `candles` view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceActionReport {
    pub candle: CandleRead,
    pub volume: VolumeRead,
    pub signals: Vec<String>,
}

/// Human-readable signal lines: pattern signals, volume notes, then any entry setup.
pub fn entry_signals(candle: &CandleRead, volume: &VolumeRead) -> Vec<String> {
    let mut signals: Vec<String> = candle.patterns.iter().map(|p| p.signal().to_string()).collect();

    if let Some(note) = volume.band.note() {
        signals.push(note.to_string());
    }

    if volume.change_percent > 20.0 {
        if candle.bullish {
            signals.push("BULLISH SETUP: Strong bullish candle with high volume".to_string());
            signals.push("Consider LONG entry on pullback or breakout confirmation".to_string());
        } else {
            signals.push("BEARISH SETUP: Strong bearish candle with high volume".to_string());
            signals.push("Consider SHORT entry on rally or breakdown confirmation".to_string());
        }
    }

    if candle.patterns.is_empty() {
        signals.push("No clear pattern - wait for better setup".to_string());
    }

    signals
}

pub fn price_action(snapshot: &OhlcvSnapshot) -> PriceActionReport {
    let candle = analyze_candle(&snapshot.current);
    let volume = analyze_volume(snapshot.current.volume, snapshot.previous.volume);
    let signals = entry_signals(&candle, &volume);
    PriceActionReport { candle, volume, signals }
}
