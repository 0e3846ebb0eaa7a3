//! Exchange parameter table: fees, leverage caps, maintenance-margin tiers.

mod config;
mod table;

pub use config::AccountType;
pub use table::{ExchangeTable, DEFAULT_EXCHANGE};
