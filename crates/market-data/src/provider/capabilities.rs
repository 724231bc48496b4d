//! Provider capabilities and rate limiting configuration.
//!
//! This module defines structures for describing what a spot price provider
//! can do and how it should be rate-limited.

use std::time::Duration;

/// Describes the capabilities of a spot price provider.
#[derive(Clone, Debug)]
pub struct ProviderCapabilities {
    /// Length of one priced interval.
    pub interval: Duration,

    /// Whether arbitrary past days can be requested.
    ///
    /// Providers without history only serve the currently published window
    /// (typically today and, after publication, tomorrow).
    pub supports_historical: bool,

    /// Local hour at which next-day prices are usually published.
    pub publication_hour: u32,
}

/// Rate limiting configuration for a provider.
///
/// Controls how aggressively we can call a provider to avoid
/// hitting their fair-use limits and getting blocked.
#[derive(Clone, Debug)]
pub struct RateLimit {
    /// Maximum requests allowed per minute.
    pub requests_per_minute: u32,

    /// Number of requests that may be sent back-to-back before throttling.
    pub burst: u32,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
            burst: 10,
        }
    }
}

impl RateLimit {
    /// Time it takes to earn one request token.
    pub fn refill_interval(&self) -> Duration {
        Duration::from_secs_f64(60.0 / f64::from(self.requests_per_minute.max(1)))
    }
}
