//! Spot price provider trait definitions.
//!
//! This module defines the core `SpotPriceProvider` trait that all
//! spot price providers must implement.

use async_trait::async_trait;
use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::errors::MarketDataError;
use crate::models::SpotPrice;

use super::capabilities::{ProviderCapabilities, RateLimit};

/// Trait for spot price providers.
///
/// Implement this trait to add support for a new upstream source.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use spotprice_market_data::provider::{ProviderCapabilities, RateLimit, SpotPriceProvider};
///
/// struct MyProvider;
///
/// #[async_trait]
/// impl SpotPriceProvider for MyProvider {
///     fn id(&self) -> &'static str {
///         "MY_PROVIDER"
///     }
///
///     fn timezone(&self) -> Tz {
///         chrono_tz::Europe::Vienna
///     }
///
///     // ... implement capabilities, rate_limit and get_day_prices
/// }
/// ```
#[async_trait]
pub trait SpotPriceProvider: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// Should be a constant string like "AWATTAR", "SMARTENERGY".
    /// Used for logging and error messages.
    fn id(&self) -> &'static str;

    /// Time zone of the market calendar this provider publishes for.
    fn timezone(&self) -> Tz;

    /// Describes what this provider can do.
    fn capabilities(&self) -> ProviderCapabilities;

    /// Rate limiting configuration.
    fn rate_limit(&self) -> RateLimit {
        RateLimit::default()
    }

    /// Fetch all prices of one local calendar day.
    ///
    /// # Arguments
    ///
    /// * `day` - Calendar date in the provider's [`timezone`](Self::timezone)
    ///
    /// # Returns
    ///
    /// Prices whose interval starts within `day`, ordered by start ascending.
    /// An empty vector means nothing is published for `day` (yet).
    async fn get_day_prices(&self, day: NaiveDate) -> Result<Vec<SpotPrice>, MarketDataError>;
}
