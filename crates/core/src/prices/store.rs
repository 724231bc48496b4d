//! Price record storage trait.
//!
//! This module defines the storage interface for price records. The trait
//! abstracts the persistence layer so the reconciliation engine can run
//! against SQLite in production and an in-memory store in tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use chrono_tz::Tz;
use std::collections::BTreeSet;

use super::model::PriceRecord;
use super::types::SourceId;
use crate::errors::Result;

// =============================================================================
// Record Store
// =============================================================================

/// Storage interface for price records.
///
/// # Design Notes
///
/// - Every method is async so callers can bound it with a timeout
/// - Records are keyed by `(source, start_timestamp)`
/// - There is no delete operation; retention is handled outside the engine
///
/// # Method Naming Convention
///
/// - `*_in_range` - Queries over an inclusive `[start, end]` epoch-second range
#[async_trait]
pub trait RecordStore: Send + Sync {
    // =========================================================================
    // Mutations
    // =========================================================================

    /// Inserts or replaces each record by its `(source, start_timestamp)` key.
    ///
    /// The call is atomic: either every record is written or none is.
    ///
    /// # Returns
    ///
    /// The number of rows that were inserted or whose values changed.
    /// Re-merging identical values returns 0.
    async fn upsert_merge(&self, records: &[PriceRecord]) -> Result<usize>;

    // =========================================================================
    // Queries
    // =========================================================================

    /// Source-local calendar dates with at least one record.
    async fn distinct_covered_dates(&self, source: &SourceId, tz: Tz) -> Result<BTreeSet<NaiveDate>>;

    /// Ascending start timestamps within `[start, end]`.
    async fn timestamps_in_range(&self, source: &SourceId, start: i64, end: i64) -> Result<Vec<i64>>;

    /// First and last start timestamp of the source, if any record exists.
    ///
    /// Reports the stored span for coverage summaries. The missing-date scan
    /// bounds itself from [`RecordStore::distinct_covered_dates`] instead.
    async fn first_and_last_timestamp(&self, source: &SourceId) -> Result<Option<(i64, i64)>>;

    /// Records with a start timestamp within `[start, end]`, ascending.
    async fn records_in_range(
        &self,
        source: &SourceId,
        start: i64,
        end: i64,
    ) -> Result<Vec<PriceRecord>>;
}
