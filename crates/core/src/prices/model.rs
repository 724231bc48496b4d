//! Domain models for price records and reconciliation units.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use spotprice_market_data::SpotPrice;

/// One priced interval of one source.
///
/// `(source, start_timestamp)` is the identity of a record. Writing a record
/// with an existing key replaces the stored values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRecord {
    pub source: String,
    /// Epoch seconds
    pub start_timestamp: i64,
    /// Epoch seconds, `start_timestamp + interval_length`
    pub end_timestamp: i64,
    pub price: f64,
    pub unit: String,
}

impl PriceRecord {
    pub fn new(
        source: impl Into<String>,
        start_timestamp: i64,
        end_timestamp: i64,
        price: f64,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            start_timestamp,
            end_timestamp,
            price,
            unit: unit.into(),
        }
    }

    pub fn from_spot_price(source: &str, spot: &SpotPrice) -> Self {
        Self::new(
            source,
            spot.start.timestamp(),
            spot.end.timestamp(),
            spot.price,
            spot.unit.clone(),
        )
    }

    pub fn key(&self) -> (&str, i64) {
        (&self.source, self.start_timestamp)
    }

    /// True if writing `other` over `self` would not change anything.
    pub fn same_values(&self, other: &PriceRecord) -> bool {
        self.key() == other.key()
            && self.end_timestamp == other.end_timestamp
            && self.price == other.price
            && self.unit == other.unit
    }
}

/// A contiguous span `(start, end)` in epoch seconds with no stored record.
///
/// Produced by gap detection and consumed within the same pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoverageWindow {
    pub start: i64,
    pub end: i64,
}

impl CoverageWindow {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn duration_secs(&self) -> i64 {
        self.end - self.start
    }

    /// Inclusive on both ends.
    pub fn contains(&self, timestamp: i64) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }
}

impl fmt::Display for CoverageWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.start, self.end)
    }
}

/// Which discovery step a unit belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapKind {
    WholeDate,
    Interior,
}

impl fmt::Display for GapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GapKind::WholeDate => write!(f, "whole-date"),
            GapKind::Interior => write!(f, "interior"),
        }
    }
}

/// Unit of work of a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReconcileUnit {
    /// A source-local date with no record at all.
    Date { date: NaiveDate },
    /// An interior gap, resolved to one source-local date it touches.
    Window {
        date: NaiveDate,
        window: CoverageWindow,
    },
    /// Gap discovery itself (store query) for one phase.
    Discovery { kind: GapKind },
}

impl ReconcileUnit {
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            ReconcileUnit::Date { date } | ReconcileUnit::Window { date, .. } => Some(*date),
            ReconcileUnit::Discovery { .. } => None,
        }
    }
}

impl fmt::Display for ReconcileUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileUnit::Date { date } => write!(f, "date {}", date),
            ReconcileUnit::Window { date, window } => write!(f, "window {} on {}", window, date),
            ReconcileUnit::Discovery { kind } => write!(f, "{} discovery", kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_values_ignores_nothing_but_identity() {
        let a = PriceRecord::new("awattar", 0, 3600, 10.0, "ct/kWh");
        let mut b = a.clone();
        assert!(a.same_values(&b));

        b.price = 10.5;
        assert!(!a.same_values(&b));

        let c = PriceRecord::new("smartenergy", 0, 3600, 10.0, "ct/kWh");
        assert!(!a.same_values(&c));
    }

    #[test]
    fn test_window_contains_is_inclusive() {
        let window = CoverageWindow::new(3600, 10_800);
        assert!(window.contains(3600));
        assert!(window.contains(10_800));
        assert!(!window.contains(10_801));
        assert_eq!(window.duration_secs(), 7200);
    }

    #[test]
    fn test_unit_display() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(ReconcileUnit::Date { date }.to_string(), "date 2024-01-02");
        assert_eq!(
            ReconcileUnit::Discovery {
                kind: GapKind::Interior
            }
            .to_string(),
            "interior discovery"
        );
    }
}
