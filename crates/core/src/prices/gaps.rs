//! Gap detection over stored coverage.
//!
//! Two complementary scans:
//!
//! - **Whole-date gaps**: calendar dates with no record at all, bounded by
//!   the store's own history plus the look-ahead day.
//! - **Interior gaps**: holes longer than one interval inside a window,
//!   including partial days that whole-date detection cannot see.

use chrono::{NaiveDate, NaiveDateTime};
use chrono_tz::Tz;
use std::collections::BTreeSet;

use super::cutoff::CutoffPolicy;
use super::model::CoverageWindow;
use super::store::RecordStore;
use super::types::SourceId;
use crate::errors::Result;
use crate::utils::time_utils::{get_days_between, local_date_from_epoch};

/// Dates missing from `covered`.
///
/// Scans `[min(covered), max(max(covered), tomorrow)]`. An empty store
/// yields only `today`.
pub fn find_missing_dates(covered: &BTreeSet<NaiveDate>, today: NaiveDate) -> Vec<NaiveDate> {
    let (Some(first), Some(last)) = (covered.first(), covered.last()) else {
        return vec![today];
    };

    let tomorrow = today.succ_opt().unwrap_or(today);
    let end = (*last).max(tomorrow);

    get_days_between(*first, end)
        .into_iter()
        .filter(|d| !covered.contains(d))
        .collect()
}

/// Missing dates that the cutoff policy allows fetching now.
pub fn plan_missing_dates(
    covered: &BTreeSet<NaiveDate>,
    now_local: NaiveDateTime,
    policy: &CutoffPolicy,
) -> Vec<NaiveDate> {
    find_missing_dates(covered, now_local.date())
        .into_iter()
        .filter(|d| policy.is_fetchable(*d, now_local))
        .collect()
}

/// Holes in an ascending timestamp sequence within `[window_start, window_end]`.
///
/// A hole is reported when a distance is strictly greater than `interval`:
/// before the first timestamp, between neighbours, and after the last one.
/// Without any timestamps the whole window is one gap.
pub fn find_interior_gaps(
    timestamps: &[i64],
    window_start: i64,
    window_end: i64,
    interval: i64,
) -> Vec<CoverageWindow> {
    let (Some(&first), Some(&last)) = (timestamps.first(), timestamps.last()) else {
        if window_end > window_start {
            return vec![CoverageWindow::new(window_start, window_end)];
        }
        return Vec::new();
    };

    let mut gaps = Vec::new();

    if first - window_start > interval {
        gaps.push(CoverageWindow::new(window_start, first));
    }

    for pair in timestamps.windows(2) {
        if pair[1] - pair[0] > interval {
            gaps.push(CoverageWindow::new(pair[0], pair[1]));
        }
    }

    if window_end - last > interval {
        gaps.push(CoverageWindow::new(last, window_end));
    }

    gaps
}

/// Source-local dates touched by the open interior `(start, end)` of a window.
///
/// The bounds themselves are existing records (or the scan edges), so a gap
/// ending exactly at local midnight does not pull in the following day.
pub fn dates_in_window(window: &CoverageWindow, tz: Tz) -> Vec<NaiveDate> {
    let (first, last) = if window.end - window.start >= 2 {
        (window.start + 1, window.end - 1)
    } else {
        (window.start, window.end)
    };

    match (
        local_date_from_epoch(first, tz),
        local_date_from_epoch(last, tz),
    ) {
        (Some(from), Some(to)) => get_days_between(from, to),
        _ => Vec::new(),
    }
}

// =============================================================================
// Store-bound helpers
// =============================================================================

/// Whole-date gaps of `source` as seen by `store`, before cutoff filtering.
pub async fn detect_missing_dates(
    store: &dyn RecordStore,
    source: &SourceId,
    tz: Tz,
    today: NaiveDate,
) -> Result<Vec<NaiveDate>> {
    let covered = store.distinct_covered_dates(source, tz).await?;
    Ok(find_missing_dates(&covered, today))
}

/// Interior gaps of `source` within `[window_start, window_end]`.
pub async fn detect_interior_gaps(
    store: &dyn RecordStore,
    source: &SourceId,
    window_start: i64,
    window_end: i64,
    interval: i64,
) -> Result<Vec<CoverageWindow>> {
    let timestamps = store
        .timestamps_in_range(source, window_start, window_end)
        .await?;
    Ok(find_interior_gaps(
        &timestamps,
        window_start,
        window_end,
        interval,
    ))
}
