//! Market data models
//!
//! This module contains the core data types for spot price fetching:
//! - `types` - Market zones
//! - `spot_price` - One priced interval (SpotPrice)
//! - `config` - Explicit per-provider configuration (ProviderConfig)

mod config;
mod spot_price;
mod types;

pub use config::ProviderConfig;
pub use spot_price::SpotPrice;
pub use types::MarketZone;
