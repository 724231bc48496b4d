//! Spot price provider abstractions and implementations.
//!
//! This module contains:
//! - The `SpotPriceProvider` trait that all providers implement
//! - Provider capabilities and rate limiting configuration
//! - Concrete provider implementations (aWATTar, smartENERGY)
//!
//! # Architecture
//!
//! The provider system is designed to be:
//! - **Provider-agnostic**: The core system doesn't know about specific providers
//! - **Extensible**: New providers can be added by implementing `SpotPriceProvider`
//! - **Polite**: Each provider throttles itself through a `RateLimiter`

pub mod calendar;
mod capabilities;
mod http;
mod rate_limiter;
mod traits;

pub mod awattar;
pub mod smartenergy;

// Re-exports
pub use capabilities::{ProviderCapabilities, RateLimit};
pub use rate_limiter::RateLimiter;
pub use traits::SpotPriceProvider;
