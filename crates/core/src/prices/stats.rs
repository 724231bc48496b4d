//! Price statistics and coverage summaries over stored records.

use chrono::{Duration as ChronoDuration, NaiveDate, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::gaps::find_missing_dates;
use super::model::PriceRecord;
use super::store::RecordStore;
use super::types::SourceId;
use crate::errors::Result;
use crate::utils::time_utils::{local_date_from_epoch, local_day_bounds_epoch};

/// A price together with the start of its interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub price: f64,
    pub timestamp: i64,
}

/// Min, max and average price of a source over `[start_ts, end_ts)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceStats {
    pub source: SourceId,
    pub start_ts: i64,
    pub end_ts: i64,
    pub min: Option<PricePoint>,
    pub max: Option<PricePoint>,
    pub avg: Option<f64>,
    pub records: usize,
}

/// First/last stored timestamp and date coverage of a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageSummary {
    pub source: SourceId,
    pub first_timestamp: Option<i64>,
    pub last_timestamp: Option<i64>,
    pub covered_dates: usize,
    /// Whole-date gaps, before cutoff filtering.
    pub missing_dates: Vec<NaiveDate>,
}

/// Calendar period for statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timespan {
    Day(NaiveDate),
    /// ISO week
    Week { year: i32, week: u32 },
    Month { year: i32, month: u32 },
}

impl Timespan {
    /// Half-open epoch bounds of the period in `tz`. `None` for invalid periods.
    pub fn bounds(&self, tz: Tz) -> Option<(i64, i64)> {
        let (first, last) = match *self {
            Timespan::Day(day) => (day, day),
            Timespan::Week { year, week } => {
                let monday = NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)?;
                (monday, monday + ChronoDuration::days(6))
            }
            Timespan::Month { year, month } => {
                let first = NaiveDate::from_ymd_opt(year, month, 1)?;
                let next = if month == 12 {
                    NaiveDate::from_ymd_opt(year + 1, 1, 1)?
                } else {
                    NaiveDate::from_ymd_opt(year, month + 1, 1)?
                };
                (first, next.pred_opt()?)
            }
        };
        Some((
            local_day_bounds_epoch(first, tz).0,
            local_day_bounds_epoch(last, tz).1,
        ))
    }
}

/// Half-open bounds of the `days` local days ending with `day`.
pub fn trailing_days_bounds(day: NaiveDate, days: u32, tz: Tz) -> (i64, i64) {
    let span = i64::from(days.max(1)) - 1;
    let first = day - ChronoDuration::days(span);
    (
        local_day_bounds_epoch(first, tz).0,
        local_day_bounds_epoch(day, tz).1,
    )
}

/// Statistics over records starting within `[start_ts, end_ts)`.
///
/// Ties for min and max resolve to the earliest interval.
pub fn compute_stats(
    source: &SourceId,
    start_ts: i64,
    end_ts: i64,
    records: &[PriceRecord],
) -> PriceStats {
    let in_range: Vec<&PriceRecord> = records
        .iter()
        .filter(|r| r.start_timestamp >= start_ts && r.start_timestamp < end_ts)
        .collect();

    let point = |r: &&PriceRecord| PricePoint {
        price: r.price,
        timestamp: r.start_timestamp,
    };

    let min = in_range
        .iter()
        .min_by(|a, b| {
            a.price
                .total_cmp(&b.price)
                .then(a.start_timestamp.cmp(&b.start_timestamp))
        })
        .map(point);
    let max = in_range
        .iter()
        .max_by(|a, b| {
            a.price
                .total_cmp(&b.price)
                .then(b.start_timestamp.cmp(&a.start_timestamp))
        })
        .map(point);
    let avg = if in_range.is_empty() {
        None
    } else {
        Some(in_range.iter().map(|r| r.price).sum::<f64>() / in_range.len() as f64)
    };

    PriceStats {
        source: source.clone(),
        start_ts,
        end_ts,
        min,
        max,
        avg,
        records: in_range.len(),
    }
}

/// Loads records of `[start_ts, end_ts)` and computes their statistics.
pub async fn price_stats(
    store: &dyn RecordStore,
    source: &SourceId,
    start_ts: i64,
    end_ts: i64,
) -> Result<PriceStats> {
    if end_ts <= start_ts {
        return Ok(compute_stats(source, start_ts, end_ts, &[]));
    }
    let records = store.records_in_range(source, start_ts, end_ts - 1).await?;
    Ok(compute_stats(source, start_ts, end_ts, &records))
}

/// Summarizes what the store holds for `source`.
pub async fn coverage_summary(
    store: &dyn RecordStore,
    source: &SourceId,
    tz: Tz,
    today: NaiveDate,
) -> Result<CoverageSummary> {
    let bounds = store.first_and_last_timestamp(source).await?;
    let covered = store.distinct_covered_dates(source, tz).await?;
    let missing_dates = if covered.is_empty() {
        Vec::new()
    } else {
        find_missing_dates(&covered, today)
            .into_iter()
            .filter(|d| *d <= today)
            .collect()
    };

    Ok(CoverageSummary {
        source: source.clone(),
        first_timestamp: bounds.map(|(first, _)| first),
        last_timestamp: bounds.map(|(_, last)| last),
        covered_dates: covered.len(),
        missing_dates,
    })
}

/// Average price per local day, ascending by date.
pub fn daily_averages(records: &[PriceRecord], tz: Tz) -> Vec<(NaiveDate, f64)> {
    let mut buckets: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for record in records {
        if let Some(date) = local_date_from_epoch(record.start_timestamp, tz) {
            let entry = buckets.entry(date).or_insert((0.0, 0));
            entry.0 += record.price;
            entry.1 += 1;
        }
    }
    buckets
        .into_iter()
        .map(|(date, (sum, count))| (date, sum / count as f64))
        .collect()
}
