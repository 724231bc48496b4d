//! Publication cutoff for not-yet-released prices.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_PUBLICATION_HOUR;

/// Decides whether a date can be fetched at a given local wall-clock time.
///
/// Today and all past dates are always fetchable. Tomorrow becomes
/// fetchable once the local hour reaches `publication_hour`. Anything later
/// is never fetchable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutoffPolicy {
    pub publication_hour: u32,
}

impl Default for CutoffPolicy {
    fn default() -> Self {
        Self {
            publication_hour: DEFAULT_PUBLICATION_HOUR,
        }
    }
}

impl CutoffPolicy {
    pub fn new(publication_hour: u32) -> Self {
        Self { publication_hour }
    }

    /// `now_local` is the wall-clock time in the source's time zone.
    pub fn is_fetchable(&self, date: NaiveDate, now_local: NaiveDateTime) -> bool {
        let today = now_local.date();
        if date <= today {
            return true;
        }
        match today.succ_opt() {
            Some(tomorrow) if date == tomorrow => now_local.hour() >= self.publication_hour,
            _ => false,
        }
    }
}

/// Wall-clock time of `now` in `tz`.
pub fn local_now(now: DateTime<Utc>, tz: Tz) -> NaiveDateTime {
    now.with_timezone(&tz).naive_local()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_tomorrow_before_publication() {
        let policy = CutoffPolicy::default();
        assert!(!policy.is_fetchable(date(2024, 1, 4), at(2024, 1, 3, 13, 59)));
    }

    #[test]
    fn test_tomorrow_at_publication() {
        let policy = CutoffPolicy::default();
        assert!(policy.is_fetchable(date(2024, 1, 4), at(2024, 1, 3, 14, 0)));
    }

    #[test]
    fn test_day_after_tomorrow_never() {
        let policy = CutoffPolicy::default();
        for hour in 0..24 {
            assert!(!policy.is_fetchable(date(2024, 1, 5), at(2024, 1, 3, hour, 0)));
        }
    }

    #[test]
    fn test_today_and_past_always() {
        let policy = CutoffPolicy::default();
        let now = at(2024, 1, 3, 0, 0);
        assert!(policy.is_fetchable(date(2024, 1, 3), now));
        assert!(policy.is_fetchable(date(2023, 6, 1), now));
    }

    #[test]
    fn test_custom_publication_hour() {
        let policy = CutoffPolicy::new(13);
        assert!(policy.is_fetchable(date(2024, 1, 4), at(2024, 1, 3, 13, 0)));
    }

    #[test]
    fn test_local_now_uses_source_zone() {
        let now = DateTime::parse_from_rfc3339("2024-01-03T13:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let local = local_now(now, chrono_tz::Europe::Vienna);
        assert_eq!(local, at(2024, 1, 3, 14, 30));
        assert!(CutoffPolicy::default().is_fetchable(date(2024, 1, 4), local));
    }
}
