use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One priced interval as delivered by a provider.
///
/// Prices are normalized to the unit in `unit` by the provider that produced
/// them; consumers must not assume a unit beyond what the field says.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpotPrice {
    /// Start of the priced interval
    pub start: DateTime<Utc>,

    /// End of the priced interval (exclusive)
    pub end: DateTime<Utc>,

    /// Price for the interval
    pub price: f64,

    /// Unit tag for `price` (e.g. "ct/kWh")
    pub unit: String,
}

impl SpotPrice {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, price: f64, unit: impl Into<String>) -> Self {
        Self {
            start,
            end,
            price,
            unit: unit.into(),
        }
    }

    /// Interval length in seconds.
    pub fn duration_secs(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }
}
