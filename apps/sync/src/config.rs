use anyhow::{bail, Context};
use std::str::FromStr;
use std::time::Duration;

use spotprice_core::prices::{ReconciliationConfig, SourceId};
use spotprice_market_data::{AwattarProvider, MarketZone};

pub struct Config {
    pub db_path: String,
    pub sources: Vec<SourceId>,
    pub reconciliation: ReconciliationConfig,
    /// `None` runs a single pass and exits.
    pub sync_interval: Option<Duration>,
    pub awattar_market: MarketZone,
    pub awattar_base_url: String,
    pub smartenergy_base_url: String,
    pub log_format: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Unset keys fall back
    /// to their defaults; set keys must parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let db_path = lookup("SPOT_DB_PATH").unwrap_or_else(|| "./db/spotprices.db".into());

        let sources = parse_sources(&lookup("SPOT_SOURCES").unwrap_or_else(|| "awattar".into()))?;

        let defaults = ReconciliationConfig::default();
        let reconciliation = ReconciliationConfig {
            lookback_days: parse_or(&lookup, "SPOT_LOOKBACK_DAYS", defaults.lookback_days)?,
            publication_hour: parse_optional(&lookup, "SPOT_PUBLICATION_HOUR")?,
            fetch_timeout_secs: parse_or(
                &lookup,
                "SPOT_FETCH_TIMEOUT_SECS",
                defaults.fetch_timeout_secs,
            )?,
            store_timeout_secs: defaults.store_timeout_secs,
        };
        reconciliation.validate()?;

        let interval_secs: u64 = parse_or(&lookup, "SPOT_SYNC_INTERVAL_SECS", 0)?;
        let sync_interval = (interval_secs > 0).then(|| Duration::from_secs(interval_secs));

        let awattar_market = match lookup("AWATTAR_MARKET") {
            Some(raw) => MarketZone::from_str(&raw).map_err(anyhow::Error::msg)?,
            None => MarketZone::default(),
        };
        let awattar_base_url = lookup("AWATTAR_BASE_URL")
            .unwrap_or_else(|| AwattarProvider::default_base_url(awattar_market).to_string());
        let smartenergy_base_url = lookup("SMARTENERGY_BASE_URL")
            .unwrap_or_else(|| spotprice_market_data::provider::smartenergy::DEFAULT_BASE_URL.into());

        let log_format = lookup("SPOT_LOG_FORMAT").unwrap_or_else(|| "text".to_string());

        Ok(Self {
            db_path,
            sources,
            reconciliation,
            sync_interval,
            awattar_market,
            awattar_base_url,
            smartenergy_base_url,
            log_format,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}: '{}'", key, raw)),
        None => Ok(default),
    }
}

fn parse_optional<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .with_context(|| format!("Invalid {}: '{}'", key, raw))
        })
        .transpose()
}

fn parse_sources(raw: &str) -> anyhow::Result<Vec<SourceId>> {
    let mut sources = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let source = match name.to_ascii_lowercase().as_str() {
            "awattar" => SourceId::awattar(),
            "smartenergy" => SourceId::smartenergy(),
            other => bail!("Unknown source in SPOT_SOURCES: '{}'", other),
        };
        if !sources.contains(&source) {
            sources.push(source);
        }
    }
    if sources.is_empty() {
        bail!("SPOT_SOURCES names no source");
    }
    Ok(sources)
}
