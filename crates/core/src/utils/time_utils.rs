use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use spotprice_market_data::provider::calendar;

/// Converts a UTC instant to a calendar date in the given timezone.
///
/// This is the single source of truth for converting instants to domain dates.
/// Prices are published per local day, so every date in this crate is
/// source-local.
pub fn local_date_from_utc(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Epoch seconds to a UTC instant. `None` when out of range.
pub fn utc_from_epoch(timestamp: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(timestamp, 0).single()
}

/// Epoch seconds to a source-local calendar date.
pub fn local_date_from_epoch(timestamp: i64, tz: Tz) -> Option<NaiveDate> {
    utc_from_epoch(timestamp).map(|instant| local_date_from_utc(instant, tz))
}

/// Half-open `[start, end)` epoch-second bounds of a local calendar day.
///
/// Days are 23 or 25 hours long around DST transitions.
pub fn local_day_bounds_epoch(day: NaiveDate, tz: Tz) -> (i64, i64) {
    let (start, end) = calendar::local_day_bounds(day, tz);
    (start.timestamp(), end.timestamp())
}

pub fn get_days_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    if start > end {
        return Vec::new();
    }
    let mut days = Vec::new();
    let mut current = start;
    while current <= end {
        days.push(current);
        if let Some(next) = current.succ_opt() {
            current = next;
        } else {
            break;
        }
    }
    days
}
