//! Derived statistics over journal trades.

mod calculator;

pub use calculator::StatsCalculator;
