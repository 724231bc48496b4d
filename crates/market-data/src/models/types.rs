use std::fmt;
use std::str::FromStr;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Bidding zone of a day-ahead market.
///
/// Determines the local calendar (and therefore the day boundaries)
/// a provider publishes prices for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MarketZone {
    /// Austria (EXAA / EPEX AT)
    #[default]
    At,
    /// Germany-Luxembourg (EPEX DE-LU)
    De,
}

impl MarketZone {
    /// Local time zone of the zone's market calendar.
    pub fn timezone(self) -> Tz {
        match self {
            MarketZone::At => chrono_tz::Europe::Vienna,
            MarketZone::De => chrono_tz::Europe::Berlin,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MarketZone::At => "at",
            MarketZone::De => "de",
        }
    }
}

impl fmt::Display for MarketZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketZone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "at" => Ok(MarketZone::At),
            "de" => Ok(MarketZone::De),
            other => Err(format!("Unknown market zone: {}", other)),
        }
    }
}
