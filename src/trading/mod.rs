//! Position calculator: risk-based sizing, leverage math and advisory warnings.

mod calculator;
mod config;
mod validation;

pub use calculator::{CalculationInput, PositionCalculator};
pub use config::RiskConfig;
