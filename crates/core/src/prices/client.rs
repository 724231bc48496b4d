//! Source client capability and its provider-backed implementation.
//!
//! The reconciliation engine only sees [`SourceClient`]. Each upstream
//! provider from the market-data crate is wrapped in a
//! [`ProviderSourceClient`], which converts prices into [`PriceRecord`]s and
//! classifies provider errors into [`SourceError`].

use async_trait::async_trait;
use chrono::NaiveDate;
use chrono_tz::Tz;
use log::debug;
use std::sync::Arc;

use spotprice_market_data::SpotPriceProvider;

use super::errors::SourceError;
use super::model::PriceRecord;
use super::types::SourceId;

/// Fetches one source-local calendar day of price records.
#[async_trait]
pub trait SourceClient: Send + Sync {
    fn source_id(&self) -> &SourceId;

    /// Time zone calendar dates of this source are expressed in.
    fn timezone(&self) -> Tz;

    /// Length of one priced interval in seconds.
    fn interval_length(&self) -> i64;

    /// Whether dates before today can still be fetched.
    fn supports_history(&self) -> bool {
        true
    }

    /// Local hour from which the next day is published, if the source knows it.
    fn publication_hour(&self) -> Option<u32> {
        None
    }

    /// Records of `day` only, or an empty list if nothing is published yet.
    ///
    /// Safe to call repeatedly for the same day.
    async fn fetch(&self, day: NaiveDate) -> Result<Vec<PriceRecord>, SourceError>;
}

/// [`SourceClient`] backed by a market-data provider.
pub struct ProviderSourceClient {
    source: SourceId,
    provider: Arc<dyn SpotPriceProvider>,
}

impl ProviderSourceClient {
    pub fn new(source: SourceId, provider: Arc<dyn SpotPriceProvider>) -> Self {
        Self { source, provider }
    }
}

#[async_trait]
impl SourceClient for ProviderSourceClient {
    fn source_id(&self) -> &SourceId {
        &self.source
    }

    fn timezone(&self) -> Tz {
        self.provider.timezone()
    }

    fn interval_length(&self) -> i64 {
        self.provider.capabilities().interval.as_secs() as i64
    }

    fn supports_history(&self) -> bool {
        self.provider.capabilities().supports_historical
    }

    fn publication_hour(&self) -> Option<u32> {
        Some(self.provider.capabilities().publication_hour)
    }

    async fn fetch(&self, day: NaiveDate) -> Result<Vec<PriceRecord>, SourceError> {
        let prices = self
            .provider
            .get_day_prices(day)
            .await
            .map_err(|e| SourceError::from_market_data(self.source.as_str(), &e))?;

        debug!(
            "{} delivered {} prices for {} via {}",
            self.source,
            prices.len(),
            day,
            self.provider.id()
        );

        Ok(prices
            .iter()
            .map(|p| PriceRecord::from_spot_price(self.source.as_str(), p))
            .collect())
    }
}
