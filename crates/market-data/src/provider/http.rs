//! Shared HTTP plumbing for provider implementations.

use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::errors::MarketDataError;
use crate::models::ProviderConfig;

/// Builds a client honoring the configured request timeout.
pub(crate) fn build_client(config: &ProviderConfig) -> Client {
    Client::builder()
        .timeout(config.timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Sends a GET request and returns the raw body of a successful response.
pub(crate) async fn get_text(
    client: &Client,
    provider: &'static str,
    url: &str,
    params: &[(&str, String)],
) -> Result<String, MarketDataError> {
    debug!("{} request: {} with {} params", provider, url, params.len());

    let response = client
        .get(url)
        .query(params)
        .send()
        .await
        .map_err(|e| MarketDataError::from_request(provider, e))?;

    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(MarketDataError::RateLimited {
            provider: provider.to_string(),
        });
    }

    if !status.is_success() {
        return Err(MarketDataError::HttpStatus {
            provider: provider.to_string(),
            status: status.as_u16(),
        });
    }

    response
        .text()
        .await
        .map_err(|e| MarketDataError::from_request(provider, e))
}

/// Decodes a JSON body, mapping failures to [`MarketDataError::Parse`].
pub(crate) fn parse_json<T: DeserializeOwned>(
    provider: &'static str,
    body: &str,
) -> Result<T, MarketDataError> {
    serde_json::from_str(body).map_err(|e| MarketDataError::Parse {
        provider: provider.to_string(),
        message: e.to_string(),
    })
}
