//! aWATTar provider for day-ahead spot prices.
//!
//! aWATTar publishes EPEX/EXAA day-ahead prices for Austria and Germany.
//! Arbitrary past ranges can be requested through
//! `GET /v1/marketdata?start=<ms>&end=<ms>`. Prices are returned in `Eur/MWh`
//! and normalized here to `ct/kWh`.
//!
//! Next-day prices are published around 14:00 local time.

mod models;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use log::debug;
use reqwest::Client;
use std::time::Duration;

use crate::errors::MarketDataError;
use crate::models::{MarketZone, ProviderConfig, SpotPrice};
use crate::provider::calendar::local_day_bounds;
use crate::provider::http::{build_client, get_text, parse_json};
use crate::provider::{ProviderCapabilities, RateLimit, RateLimiter, SpotPriceProvider};

use models::{MarketDataEntry, MarketDataResponse, AWATTAR_UNIT};

/// Provider ID constant
const PROVIDER_ID: &str = "AWATTAR";

/// Unit prices are normalized to.
pub const PRICE_UNIT: &str = "ct/kWh";

const MARKETDATA_PATH: &str = "/v1/marketdata";

/// aWATTar day-ahead price provider.
///
/// # Example
///
/// ```ignore
/// use spotprice_market_data::{AwattarProvider, MarketZone};
///
/// let provider = AwattarProvider::for_zone(MarketZone::At);
/// let prices = provider.get_day_prices(day).await?;
/// ```
pub struct AwattarProvider {
    client: Client,
    config: ProviderConfig,
    zone: MarketZone,
    limiter: RateLimiter,
}

impl AwattarProvider {
    /// Create a provider with an explicit endpoint configuration.
    pub fn new(zone: MarketZone, config: ProviderConfig) -> Self {
        let client = build_client(&config);
        let limiter = RateLimiter::new(PROVIDER_ID, &Self::limits());
        Self {
            client,
            config,
            zone,
            limiter,
        }
    }

    /// Create a provider pointing at the public endpoint of `zone`.
    pub fn for_zone(zone: MarketZone) -> Self {
        Self::new(zone, ProviderConfig::new(Self::default_base_url(zone)))
    }

    /// Public API host for a market zone.
    pub fn default_base_url(zone: MarketZone) -> &'static str {
        match zone {
            MarketZone::At => "https://api.awattar.at",
            MarketZone::De => "https://api.awattar.de",
        }
    }

    pub fn zone(&self) -> MarketZone {
        self.zone
    }

    // Fair use on the public API is 100 requests per day; keep bursts small.
    fn limits() -> RateLimit {
        RateLimit {
            requests_per_minute: 30,
            burst: 5,
        }
    }

    fn to_utc(millis: i64) -> Result<DateTime<Utc>, MarketDataError> {
        Utc.timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| MarketDataError::Parse {
                provider: PROVIDER_ID.to_string(),
                message: format!("Invalid timestamp: {}", millis),
            })
    }

    /// Convert one entry, normalizing `Eur/MWh` to `ct/kWh`.
    fn convert_entry(entry: &MarketDataEntry) -> Result<SpotPrice, MarketDataError> {
        if !entry.unit.eq_ignore_ascii_case(AWATTAR_UNIT) {
            return Err(MarketDataError::Parse {
                provider: PROVIDER_ID.to_string(),
                message: format!("Unexpected unit '{}'", entry.unit),
            });
        }

        let start = Self::to_utc(entry.start_timestamp)?;
        let end = Self::to_utc(entry.end_timestamp)?;
        if end <= start {
            return Err(MarketDataError::Parse {
                provider: PROVIDER_ID.to_string(),
                message: format!(
                    "Interval end {} is not after start {}",
                    entry.end_timestamp, entry.start_timestamp
                ),
            });
        }

        Ok(SpotPrice::new(start, end, entry.marketprice / 10.0, PRICE_UNIT))
    }

    /// Decode a response body and keep entries starting within `[start, end)`.
    fn parse_day(
        body: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SpotPrice>, MarketDataError> {
        let response: MarketDataResponse = parse_json(PROVIDER_ID, body)?;

        let mut prices = response
            .data
            .iter()
            .map(Self::convert_entry)
            .collect::<Result<Vec<_>, _>>()?;

        prices.retain(|p| p.start >= start && p.start < end);
        prices.sort_by_key(|p| p.start);
        Ok(prices)
    }
}

#[async_trait]
impl SpotPriceProvider for AwattarProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn timezone(&self) -> Tz {
        self.zone.timezone()
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            interval: Duration::from_secs(3600),
            supports_historical: true,
            publication_hour: 14,
        }
    }

    fn rate_limit(&self) -> RateLimit {
        Self::limits()
    }

    async fn get_day_prices(&self, day: NaiveDate) -> Result<Vec<SpotPrice>, MarketDataError> {
        let (start, end) = local_day_bounds(day, self.timezone());

        self.limiter.acquire().await;

        let url = self.config.url(MARKETDATA_PATH);
        let params = [
            ("start", start.timestamp_millis().to_string()),
            ("end", end.timestamp_millis().to_string()),
        ];
        let body = get_text(&self.client, PROVIDER_ID, &url, &params).await?;

        let prices = Self::parse_day(&body, start, end)?;
        debug!(
            "{} returned {} prices for {} ({})",
            PROVIDER_ID,
            prices.len(),
            day,
            self.zone
        );
        Ok(prices)
    }
}
