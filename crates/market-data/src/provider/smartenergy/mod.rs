//! smartENERGY provider for Austrian quarter-hourly spot prices.
//!
//! The public endpoint `GET /market/v1/price` only exposes the currently
//! published window (today and, after publication, tomorrow). There is no
//! range parameter, so a day request downloads the window and keeps the
//! entries of the requested local day. Past days outside the window come back
//! empty.

mod models;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use chrono_tz::Tz;
use log::{debug, warn};
use reqwest::Client;
use std::time::Duration;

use crate::errors::MarketDataError;
use crate::models::{ProviderConfig, SpotPrice};
use crate::provider::calendar::local_day_bounds;
use crate::provider::http::{build_client, get_text, parse_json};
use crate::provider::{ProviderCapabilities, RateLimit, RateLimiter, SpotPriceProvider};

use models::{PriceEntry, PriceResponse, DEFAULT_INTERVAL_MINUTES};

/// Provider ID constant
const PROVIDER_ID: &str = "SMARTENERGY";

const PRICE_UNIT: &str = "ct/kWh";
const PRICE_PATH: &str = "/market/v1/price";

/// Public API host.
pub const DEFAULT_BASE_URL: &str = "https://apis.smartenergy.at";

/// smartENERGY spot price provider (Austria only).
pub struct SmartEnergyProvider {
    client: Client,
    config: ProviderConfig,
    limiter: RateLimiter,
}

impl SmartEnergyProvider {
    pub fn new(config: ProviderConfig) -> Self {
        let client = build_client(&config);
        let limiter = RateLimiter::new(PROVIDER_ID, &RateLimit::default());
        Self {
            client,
            config,
            limiter,
        }
    }

    fn parse_error(message: String) -> MarketDataError {
        MarketDataError::Parse {
            provider: PROVIDER_ID.to_string(),
            message,
        }
    }

    fn convert_entry(
        entry: &PriceEntry,
        interval: ChronoDuration,
    ) -> Result<SpotPrice, MarketDataError> {
        let start = DateTime::parse_from_rfc3339(&entry.date)
            .map_err(|e| Self::parse_error(format!("Invalid date '{}': {}", entry.date, e)))?
            .with_timezone(&Utc);
        Ok(SpotPrice::new(start, start + interval, entry.value, PRICE_UNIT))
    }

    /// Decode a response body and keep entries starting within `[start, end)`.
    fn parse_day(
        body: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SpotPrice>, MarketDataError> {
        let response: PriceResponse = parse_json(PROVIDER_ID, body)?;

        if let Some(unit) = response.unit.as_deref() {
            if !unit.eq_ignore_ascii_case(PRICE_UNIT) {
                return Err(Self::parse_error(format!("Unexpected unit '{}'", unit)));
            }
        }

        let minutes = response.interval.unwrap_or(DEFAULT_INTERVAL_MINUTES);
        if minutes == 0 {
            return Err(Self::parse_error("Interval of 0 minutes".to_string()));
        }
        let interval = ChronoDuration::minutes(i64::from(minutes));

        let mut prices = Vec::with_capacity(response.data.len());
        for entry in &response.data {
            let price = Self::convert_entry(entry, interval)?;
            if price.start >= start && price.start < end {
                prices.push(price);
            }
        }
        prices.sort_by_key(|p| p.start);
        prices.dedup_by_key(|p| p.start);

        if prices.is_empty() && !response.data.is_empty() {
            debug!(
                "{} window ({:?}) does not contain the requested day",
                PROVIDER_ID, response.tariff
            );
        }
        Ok(prices)
    }
}

impl Default for SmartEnergyProvider {
    fn default() -> Self {
        Self::new(ProviderConfig::new(DEFAULT_BASE_URL))
    }
}

#[async_trait]
impl SpotPriceProvider for SmartEnergyProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn timezone(&self) -> Tz {
        chrono_tz::Europe::Vienna
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            interval: Duration::from_secs(u64::from(DEFAULT_INTERVAL_MINUTES) * 60),
            supports_historical: false,
            publication_hour: 14,
        }
    }

    async fn get_day_prices(&self, day: NaiveDate) -> Result<Vec<SpotPrice>, MarketDataError> {
        let (start, end) = local_day_bounds(day, self.timezone());

        self.limiter.acquire().await;

        let url = self.config.url(PRICE_PATH);
        let body = get_text(&self.client, PROVIDER_ID, &url, &[]).await?;

        let prices = Self::parse_day(&body, start, end)?;
        if prices.is_empty() && end <= Utc::now() - ChronoDuration::days(1) {
            warn!(
                "{} has no history; {} is outside the published window",
                PROVIDER_ID, day
            );
        }
        debug!("{} returned {} prices for {}", PROVIDER_ID, prices.len(), day);
        Ok(prices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn payload(dates: &[&str]) -> serde_json::Value {
        let data: Vec<_> = dates
            .iter()
            .enumerate()
            .map(|(i, d)| serde_json::json!({ "date": d, "value": 10.0 + i as f64 }))
            .collect();
        serde_json::json!({
            "tariff": "SMART_CONTROL",
            "unit": "ct/kWh",
            "interval": 15,
            "data": data
        })
    }

    async fn mount(server: &MockServer, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/market/v1/price"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[test]
    fn test_capabilities() {
        let provider = SmartEnergyProvider::default();
        assert_eq!(provider.id(), "SMARTENERGY");
        let caps = provider.capabilities();
        assert_eq!(caps.interval, Duration::from_secs(900));
        assert!(!caps.supports_historical);
    }

    #[tokio::test]
    async fn test_fetch_keeps_requested_local_day() {
        let server = MockServer::start().await;
        mount(
            &server,
            payload(&[
                "2024-01-14T23:45:00+01:00",
                "2024-01-15T00:00:00+01:00",
                "2024-01-15T00:15:00+01:00",
                "2024-01-16T00:00:00+01:00",
            ]),
        )
        .await;

        let provider = SmartEnergyProvider::new(ProviderConfig::new(server.uri()));
        let prices = provider.get_day_prices(day()).await.unwrap();

        assert_eq!(prices.len(), 2);
        assert_eq!(prices[0].start.to_rfc3339(), "2024-01-14T23:00:00+00:00");
        assert_eq!(prices[0].duration_secs(), 900);
        assert!((prices[0].price - 11.0).abs() < 1e-9);
        assert_eq!(prices[1].start.to_rfc3339(), "2024-01-14T23:15:00+00:00");
    }

    #[tokio::test]
    async fn test_day_outside_window_is_empty() {
        let server = MockServer::start().await;
        mount(&server, payload(&["2024-02-01T00:00:00+01:00"])).await;

        let provider = SmartEnergyProvider::new(ProviderConfig::new(server.uri()));
        let prices = provider.get_day_prices(day()).await.unwrap();
        assert!(prices.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_date_is_parse_error() {
        let server = MockServer::start().await;
        mount(&server, payload(&["15.01.2024 00:00"])).await;

        let provider = SmartEnergyProvider::new(ProviderConfig::new(server.uri()));
        let err = provider.get_day_prices(day()).await.unwrap_err();
        assert!(matches!(err, MarketDataError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_http_failure_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let provider = SmartEnergyProvider::new(ProviderConfig::new(server.uri()));
        let err = provider.get_day_prices(day()).await.unwrap_err();
        assert_eq!(err.retry_class(), crate::RetryClass::NextPass);
    }

    #[test]
    fn test_interval_from_payload() {
        let body = serde_json::json!({
            "unit": "ct/kWh",
            "interval": 60,
            "data": [{ "date": "2024-01-15T10:00:00+01:00", "value": 7.5 }]
        })
        .to_string();
        let (start, end) = local_day_bounds(day(), chrono_tz::Europe::Vienna);

        let prices = SmartEnergyProvider::parse_day(&body, start, end).unwrap();
        assert_eq!(prices[0].duration_secs(), 3600);
    }

    #[test]
    fn test_unexpected_unit_is_parse_error() {
        let body = serde_json::json!({
            "unit": "EUR/MWh",
            "data": []
        })
        .to_string();
        let (start, end) = local_day_bounds(day(), chrono_tz::Europe::Vienna);

        assert!(SmartEnergyProvider::parse_day(&body, start, end).is_err());
    }
}
