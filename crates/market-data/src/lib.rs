//! Spot Price Market Data Crate
//!
//! This crate provides provider-agnostic fetching of day-ahead electricity
//! spot prices.
//!
//! # Overview
//!
//! The market data crate supports:
//! - Multiple upstream providers: aWATTar (AT/DE), smartENERGY (AT)
//! - Hourly and quarter-hourly price intervals
//! - Provider-local calendar days (prices are published per local day)
//! - Client-side rate limiting
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |   Domain Layer   |  (spotprice-core, requests one local day)
//! +------------------+
//!          |
//!          v
//! +-------------------+
//! | SpotPriceProvider |  (aWATTar, smartENERGY, ...)
//! +-------------------+
//!          |
//!          v
//! +------------------+
//! |    SpotPrice     |  (one priced interval)
//! +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`SpotPrice`] - One priced interval as delivered by a provider
//! - [`SpotPriceProvider`] - Trait implemented by every upstream source
//! - [`ProviderConfig`] - Explicit endpoint/timeout configuration per provider
//! - [`MarketDataError`] - Error taxonomy with [`RetryClass`] classification

pub mod errors;
pub mod models;
pub mod provider;

pub use errors::{MarketDataError, RetryClass};
pub use models::{MarketZone, ProviderConfig, SpotPrice};

pub use provider::awattar::AwattarProvider;
pub use provider::smartenergy::SmartEnergyProvider;
pub use provider::{ProviderCapabilities, RateLimit, RateLimiter, SpotPriceProvider};
