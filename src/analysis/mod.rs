//! Candle analytics.
//!
//! Pure functions over [`Candle`](crate::models::Candle) and
//! [`OhlcvSnapshot`](crate::models::OhlcvSnapshot):
//! - Single-candle pattern naming
//! - Support/resistance and Fibonacci levels
//! - Trend and range position
//! - Price-action flags, volume conviction and entry hints

mod levels;
mod pattern;
mod price_action;
mod structure;

pub use levels::{fibonacci_levels, support_resistance};
pub use pattern::identify_pattern;
pub use price_action::price_action;
pub use structure::snapshot_structure;
