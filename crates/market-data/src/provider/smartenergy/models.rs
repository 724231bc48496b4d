//! smartENERGY API response models.

use serde::Deserialize;

/// Interval length in minutes when the payload omits it.
pub const DEFAULT_INTERVAL_MINUTES: u32 = 15;

/// Response of `GET /market/v1/price`.
#[derive(Debug, Deserialize)]
pub struct PriceResponse {
    #[serde(default)]
    pub tariff: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    /// Interval length in minutes
    #[serde(default)]
    pub interval: Option<u32>,
    pub data: Vec<PriceEntry>,
}

/// One priced interval. `date` carries an explicit UTC offset.
#[derive(Debug, Deserialize)]
pub struct PriceEntry {
    pub date: String,
    pub value: f64,
}
