//! aWATTar API response models.

use serde::Deserialize;

/// Unit aWATTar reports market prices in.
pub const AWATTAR_UNIT: &str = "Eur/MWh";

/// Response of `GET /v1/marketdata`.
#[derive(Debug, Deserialize)]
pub struct MarketDataResponse {
    pub data: Vec<MarketDataEntry>,
}

/// One priced interval; timestamps are epoch milliseconds.
#[derive(Debug, Deserialize)]
pub struct MarketDataEntry {
    pub start_timestamp: i64,
    pub end_timestamp: i64,
    pub marketprice: f64,
    pub unit: String,
}
