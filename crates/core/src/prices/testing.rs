//! In-memory doubles shared by the engine and statistics tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use chrono_tz::Tz;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::client::SourceClient;
use super::errors::SourceError;
use super::model::PriceRecord;
use super::store::RecordStore;
use super::types::SourceId;
use crate::errors::{DatabaseError, Error, Result};
use crate::utils::time_utils::{local_date_from_epoch, local_day_bounds_epoch};

/// Full hourly day with deterministic prices.
pub(crate) fn hourly_day(source: &str, date: NaiveDate, tz: Tz) -> Vec<PriceRecord> {
    let (start, end) = local_day_bounds_epoch(date, tz);
    (start..end)
        .step_by(3600)
        .map(|ts| PriceRecord::new(source, ts, ts + 3600, ((ts / 3600) % 50) as f64 / 2.0, "ct/kWh"))
        .collect()
}

// =========================================================================
// Mock RecordStore
// =========================================================================

#[derive(Clone, Default)]
pub(crate) struct MockRecordStore {
    records: Arc<Mutex<BTreeMap<(String, i64), PriceRecord>>>,
    fail_on_upsert: Arc<Mutex<bool>>,
    fail_on_query: Arc<Mutex<bool>>,
    upsert_calls: Arc<Mutex<usize>>,
}

impl MockRecordStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn seed(&self, records: Vec<PriceRecord>) {
        let mut stored = self.records.lock().unwrap();
        for record in records {
            stored.insert((record.source.clone(), record.start_timestamp), record);
        }
    }

    pub(crate) fn remove(&self, source: &str, start_timestamp: i64) {
        self.records
            .lock()
            .unwrap()
            .remove(&(source.to_string(), start_timestamp));
    }

    pub(crate) fn set_fail_on_upsert(&self, fail: bool) {
        *self.fail_on_upsert.lock().unwrap() = fail;
    }

    pub(crate) fn set_fail_on_query(&self, fail: bool) {
        *self.fail_on_query.lock().unwrap() = fail;
    }

    pub(crate) fn upsert_calls(&self) -> usize {
        *self.upsert_calls.lock().unwrap()
    }

    pub(crate) fn get_all(&self) -> Vec<PriceRecord> {
        self.records.lock().unwrap().values().cloned().collect()
    }

    fn check_query(&self) -> Result<()> {
        if *self.fail_on_query.lock().unwrap() {
            return Err(Error::Database(DatabaseError::QueryFailed(
                "Intentional query failure".into(),
            )));
        }
        Ok(())
    }

    fn source_records(&self, source: &SourceId) -> Vec<PriceRecord> {
        self.records
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.source == source.as_str())
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RecordStore for MockRecordStore {
    async fn upsert_merge(&self, records: &[PriceRecord]) -> Result<usize> {
        *self.upsert_calls.lock().unwrap() += 1;
        if *self.fail_on_upsert.lock().unwrap() {
            return Err(Error::Database(DatabaseError::TransactionFailed(
                "Intentional save failure".into(),
            )));
        }
        let mut stored = self.records.lock().unwrap();
        let mut changed = 0;
        for record in records {
            let key = (record.source.clone(), record.start_timestamp);
            let unchanged = stored
                .get(&key)
                .map(|existing| existing.same_values(record))
                .unwrap_or(false);
            if !unchanged {
                stored.insert(key, record.clone());
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn distinct_covered_dates(&self, source: &SourceId, tz: Tz) -> Result<BTreeSet<NaiveDate>> {
        self.check_query()?;
        Ok(self
            .source_records(source)
            .iter()
            .filter_map(|r| local_date_from_epoch(r.start_timestamp, tz))
            .collect())
    }

    async fn timestamps_in_range(&self, source: &SourceId, start: i64, end: i64) -> Result<Vec<i64>> {
        self.check_query()?;
        Ok(self
            .source_records(source)
            .iter()
            .map(|r| r.start_timestamp)
            .filter(|ts| *ts >= start && *ts <= end)
            .collect())
    }

    async fn first_and_last_timestamp(&self, source: &SourceId) -> Result<Option<(i64, i64)>> {
        self.check_query()?;
        let records = self.source_records(source);
        Ok(records
            .first()
            .zip(records.last())
            .map(|(first, last)| (first.start_timestamp, last.start_timestamp)))
    }

    async fn records_in_range(
        &self,
        source: &SourceId,
        start: i64,
        end: i64,
    ) -> Result<Vec<PriceRecord>> {
        self.check_query()?;
        Ok(self
            .source_records(source)
            .into_iter()
            .filter(|r| r.start_timestamp >= start && r.start_timestamp <= end)
            .collect())
    }
}

// =========================================================================
// Mock SourceClient
// =========================================================================

/// Scripted answer for one date.
#[derive(Clone, Debug)]
pub(crate) enum Scripted {
    FetchError,
    ParseError,
    Empty,
    /// Never answers within any reasonable timeout.
    Hang,
    /// Full day plus the last hour of the previous day.
    OverDeliver,
}

pub(crate) struct MockSourceClient {
    source: SourceId,
    tz: Tz,
    history: bool,
    publication_hour: Option<u32>,
    published_until: NaiveDate,
    overrides: Mutex<HashMap<NaiveDate, Scripted>>,
    calls: Mutex<Vec<NaiveDate>>,
}

impl MockSourceClient {
    /// Hourly source in Vienna with every date up to `published_until` available.
    pub(crate) fn new(source: SourceId, published_until: NaiveDate) -> Self {
        Self {
            source,
            tz: chrono_tz::Europe::Vienna,
            history: true,
            publication_hour: None,
            published_until,
            overrides: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn without_history(mut self) -> Self {
        self.history = false;
        self
    }

    pub(crate) fn with_publication_hour(mut self, hour: u32) -> Self {
        self.publication_hour = Some(hour);
        self
    }

    pub(crate) fn script(&self, date: NaiveDate, answer: Scripted) {
        self.overrides.lock().unwrap().insert(date, answer);
    }

    pub(crate) fn clear_scripts(&self) {
        self.overrides.lock().unwrap().clear();
    }

    pub(crate) fn calls(&self) -> Vec<NaiveDate> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn calls_for(&self, date: NaiveDate) -> usize {
        self.calls.lock().unwrap().iter().filter(|d| **d == date).count()
    }
}

#[async_trait]
impl SourceClient for MockSourceClient {
    fn source_id(&self) -> &SourceId {
        &self.source
    }

    fn timezone(&self) -> Tz {
        self.tz
    }

    fn interval_length(&self) -> i64 {
        3600
    }

    fn supports_history(&self) -> bool {
        self.history
    }

    fn publication_hour(&self) -> Option<u32> {
        self.publication_hour
    }

    async fn fetch(&self, day: NaiveDate) -> std::result::Result<Vec<PriceRecord>, SourceError> {
        self.calls.lock().unwrap().push(day);
        let scripted = self.overrides.lock().unwrap().get(&day).cloned();
        let published_until = self.published_until;
        let source = self.source.as_str();

        match scripted {
            Some(Scripted::FetchError) => Err(SourceError::fetch(source, "connection reset")),
            Some(Scripted::ParseError) => Err(SourceError::parse(source, "missing field `data`")),
            Some(Scripted::Empty) => Ok(Vec::new()),
            Some(Scripted::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Vec::new())
            }
            Some(Scripted::OverDeliver) => {
                let mut records = hourly_day(source, day, self.tz);
                if let Some(previous) = day
                    .pred_opt()
                    .and_then(|d| hourly_day(source, d, self.tz).pop())
                {
                    records.insert(0, previous);
                }
                Ok(records)
            }
            None if day <= published_until => Ok(hourly_day(source, day, self.tz)),
            None => Ok(Vec::new()),
        }
    }
}
