//! Reconciliation settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::cutoff::CutoffPolicy;
use crate::constants::{
    DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_LOOKBACK_DAYS, DEFAULT_PUBLICATION_HOUR,
    DEFAULT_STORE_TIMEOUT_SECS,
};
use crate::errors::{Error, Result};

/// Settings of a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReconciliationConfig {
    /// Trailing window of the interior gap scan, in days.
    pub lookback_days: u32,
    /// Local hour from which tomorrow's prices may be fetched. Overrides the
    /// hour each source announces.
    pub publication_hour: Option<u32>,
    /// Bound for one source fetch, in seconds.
    pub fetch_timeout_secs: u64,
    /// Bound for one store call, in seconds.
    pub store_timeout_secs: u64,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            publication_hour: None,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            store_timeout_secs: DEFAULT_STORE_TIMEOUT_SECS,
        }
    }
}

impl ReconciliationConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    /// Cutoff for a source announcing `source_hour`: the configured hour
    /// first, then the source's own, then the default.
    pub fn cutoff_policy_for(&self, source_hour: Option<u32>) -> CutoffPolicy {
        CutoffPolicy::new(
            self.publication_hour
                .or(source_hour)
                .unwrap_or(DEFAULT_PUBLICATION_HOUR),
        )
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(hour) = self.publication_hour.filter(|h| *h > 23) {
            return Err(Error::InvalidConfigValue(format!(
                "publication hour must be 0-23, got {}",
                hour
            )));
        }
        if self.fetch_timeout_secs == 0 || self.store_timeout_secs == 0 {
            return Err(Error::InvalidConfigValue(
                "timeouts must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}
