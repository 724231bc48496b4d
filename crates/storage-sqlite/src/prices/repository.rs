use async_trait::async_trait;
use chrono::NaiveDate;
use chrono_tz::Tz;
use diesel::dsl::{max, min};
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Double, Text};
use diesel::sqlite::SqliteConnection;
use log::debug;
use std::collections::BTreeSet;
use std::sync::Arc;

use super::model::SpotPriceDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::spot_prices::dsl as spot_prices_dsl;
use spotprice_core::errors::Error;
use spotprice_core::prices::{PriceRecord, RecordStore, SourceId};
use spotprice_core::utils::time_utils::local_date_from_epoch;
use spotprice_core::Result;

/// Inserts a record or overwrites a differing one. SQLite reports 0 changes
/// when the stored row already holds the same values.
const UPSERT_SQL: &str = "\
    INSERT INTO spot_prices (source, start_timestamp, end_timestamp, price, unit) \
    VALUES (?, ?, ?, ?, ?) \
    ON CONFLICT(source, start_timestamp) DO UPDATE SET \
        end_timestamp = excluded.end_timestamp, \
        price = excluded.price, \
        unit = excluded.unit \
    WHERE spot_prices.end_timestamp != excluded.end_timestamp \
       OR spot_prices.price != excluded.price \
       OR spot_prices.unit != excluded.unit";

pub struct SpotPriceRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SpotPriceRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    /// Runs a read on a pooled connection off the async runtime.
    async fn read<T, F>(&self, query: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = Arc::clone(&self.pool);
        tokio::task::spawn_blocking(move || {
            let mut conn = get_connection(&pool)?;
            query(&mut conn)
        })
        .await
        .map_err(|e| Error::Unexpected(format!("Read task failed: {}", e)))?
    }
}

// =============================================================================
// RecordStore Implementation
// =============================================================================

#[async_trait]
impl RecordStore for SpotPriceRepository {
    // =========================================================================
    // Mutations
    // =========================================================================

    async fn upsert_merge(&self, records: &[PriceRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let db_rows: Vec<SpotPriceDB> = records.iter().map(SpotPriceDB::from).collect();

        let changed = self
            .writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let mut total_changed = 0;
                for row in &db_rows {
                    total_changed += sql_query(UPSERT_SQL)
                        .bind::<Text, _>(&row.source)
                        .bind::<BigInt, _>(row.start_timestamp)
                        .bind::<BigInt, _>(row.end_timestamp)
                        .bind::<Double, _>(row.price)
                        .bind::<Text, _>(&row.unit)
                        .execute(conn)
                        .map_err(StorageError::QueryFailed)?;
                }
                Ok(total_changed)
            })
            .await?;

        debug!("Merged {} records, {} changed", records.len(), changed);
        Ok(changed)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    async fn distinct_covered_dates(&self, source: &SourceId, tz: Tz) -> Result<BTreeSet<NaiveDate>> {
        let source = source.as_str().to_string();
        let starts = self
            .read(move |conn| {
                spot_prices_dsl::spot_prices
                    .filter(spot_prices_dsl::source.eq(source))
                    .select(spot_prices_dsl::start_timestamp)
                    .load::<i64>(conn)
                    .into_core()
            })
            .await?;

        Ok(starts
            .into_iter()
            .filter_map(|ts| local_date_from_epoch(ts, tz))
            .collect())
    }

    async fn timestamps_in_range(&self, source: &SourceId, start: i64, end: i64) -> Result<Vec<i64>> {
        let source = source.as_str().to_string();
        self.read(move |conn| {
            spot_prices_dsl::spot_prices
                .filter(spot_prices_dsl::source.eq(source))
                .filter(spot_prices_dsl::start_timestamp.ge(start))
                .filter(spot_prices_dsl::start_timestamp.le(end))
                .select(spot_prices_dsl::start_timestamp)
                .order(spot_prices_dsl::start_timestamp.asc())
                .load::<i64>(conn)
                .into_core()
        })
        .await
    }

    async fn first_and_last_timestamp(&self, source: &SourceId) -> Result<Option<(i64, i64)>> {
        let source = source.as_str().to_string();
        let (first, last) = self
            .read(move |conn| {
                spot_prices_dsl::spot_prices
                    .filter(spot_prices_dsl::source.eq(source))
                    .select((
                        min(spot_prices_dsl::start_timestamp),
                        max(spot_prices_dsl::start_timestamp),
                    ))
                    .first::<(Option<i64>, Option<i64>)>(conn)
                    .into_core()
            })
            .await?;

        Ok(first.zip(last))
    }

    async fn records_in_range(
        &self,
        source: &SourceId,
        start: i64,
        end: i64,
    ) -> Result<Vec<PriceRecord>> {
        let source = source.as_str().to_string();
        let rows = self
            .read(move |conn| {
                spot_prices_dsl::spot_prices
                    .filter(spot_prices_dsl::source.eq(source))
                    .filter(spot_prices_dsl::start_timestamp.ge(start))
                    .filter(spot_prices_dsl::start_timestamp.le(end))
                    .order(spot_prices_dsl::start_timestamp.asc())
                    .select(SpotPriceDB::as_select())
                    .load::<SpotPriceDB>(conn)
                    .into_core()
            })
            .await?;

        Ok(rows.into_iter().map(PriceRecord::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations, spawn_writer};
    use chrono::{TimeZone, Utc};
    use chrono_tz::Europe::Vienna;
    use spotprice_core::prices::{
        ReconciliationConfig, ReconciliationService, ReconciliationServiceTrait, SourceClient,
        SourceError,
    };
    use spotprice_core::utils::time_utils::local_day_bounds_epoch;
    use spotprice_core::utils::FixedClock;
    use proptest::prelude::*;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    async fn create_test_repository() -> (SpotPriceRepository, tempfile::TempDir) {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        let db_path_str = db_path.to_string_lossy().to_string();

        let pool = create_pool(&db_path_str).expect("Failed to create pool");
        run_migrations(&pool).expect("Failed to run migrations");
        let writer = spawn_writer(Arc::clone(&pool));

        (SpotPriceRepository::new(pool, writer), temp_dir)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn hourly_day(source: &str, day: NaiveDate) -> Vec<PriceRecord> {
        let (start, end) = local_day_bounds_epoch(day, Vienna);
        (start..end)
            .step_by(3600)
            .map(|ts| PriceRecord::new(source, ts, ts + 3600, (ts % 97) as f64 / 10.0, "ct/kWh"))
            .collect()
    }

    #[tokio::test]
    async fn test_upsert_counts_only_effective_changes() {
        let (repo, _dir) = create_test_repository().await;
        let records = hourly_day(SourceId::AWATTAR, date(2024, 1, 15));

        assert_eq!(repo.upsert_merge(&records).await.unwrap(), 24);
        assert_eq!(repo.upsert_merge(&records).await.unwrap(), 0);

        let mut changed = records[5].clone();
        changed.price += 1.0;
        assert_eq!(repo.upsert_merge(&[changed.clone()]).await.unwrap(), 1);

        let stored = repo
            .records_in_range(&SourceId::awattar(), changed.start_timestamp, changed.start_timestamp)
            .await
            .unwrap();
        assert_eq!(stored, vec![changed]);
    }

    #[tokio::test]
    async fn test_overlapping_batches_keep_one_row_per_key() {
        let (repo, _dir) = create_test_repository().await;
        let day = hourly_day(SourceId::AWATTAR, date(2024, 1, 15));

        repo.upsert_merge(&day[..16]).await.unwrap();
        let added = repo.upsert_merge(&day[8..]).await.unwrap();

        assert_eq!(added, 8);
        let (start, end) = local_day_bounds_epoch(date(2024, 1, 15), Vienna);
        let stamps = repo
            .timestamps_in_range(&SourceId::awattar(), start, end)
            .await
            .unwrap();
        assert_eq!(stamps.len(), 24);
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_covered_dates_use_local_calendar() {
        let (repo, _dir) = create_test_repository().await;
        // 23:00 UTC on Jan 14 is midnight of Jan 15 in Vienna
        let ts = Utc.with_ymd_and_hms(2024, 1, 14, 23, 0, 0).unwrap().timestamp();
        repo.upsert_merge(&[PriceRecord::new(SourceId::AWATTAR, ts, ts + 3600, 5.0, "ct/kWh")])
            .await
            .unwrap();

        let dates = repo
            .distinct_covered_dates(&SourceId::awattar(), Vienna)
            .await
            .unwrap();
        assert_eq!(dates.into_iter().collect::<Vec<_>>(), vec![date(2024, 1, 15)]);
    }

    #[tokio::test]
    async fn test_range_is_inclusive_and_per_source() {
        let (repo, _dir) = create_test_repository().await;
        let awattar = hourly_day(SourceId::AWATTAR, date(2024, 1, 15));
        let smart = hourly_day(SourceId::SMARTENERGY, date(2024, 1, 15));
        repo.upsert_merge(&awattar).await.unwrap();
        repo.upsert_merge(&smart).await.unwrap();

        let start = awattar[2].start_timestamp;
        let end = awattar[4].start_timestamp;
        let records = repo
            .records_in_range(&SourceId::awattar(), start, end)
            .await
            .unwrap();

        assert_eq!(records, awattar[2..=4].to_vec());
    }

    #[tokio::test]
    async fn test_first_and_last_timestamp() {
        let (repo, _dir) = create_test_repository().await;
        assert_eq!(
            repo.first_and_last_timestamp(&SourceId::awattar()).await.unwrap(),
            None
        );

        let mut records = hourly_day(SourceId::AWATTAR, date(2024, 1, 15));
        records.extend(hourly_day(SourceId::AWATTAR, date(2024, 1, 17)));
        repo.upsert_merge(&records).await.unwrap();

        let (first, last) = repo
            .first_and_last_timestamp(&SourceId::awattar())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first, records[0].start_timestamp);
        assert_eq!(last, records[records.len() - 1].start_timestamp);
    }

    /// Publishes full hourly days up to and including `published_until`.
    struct HourlySource {
        source: SourceId,
        published_until: NaiveDate,
    }

    #[async_trait]
    impl SourceClient for HourlySource {
        fn source_id(&self) -> &SourceId {
            &self.source
        }

        fn timezone(&self) -> Tz {
            Vienna
        }

        fn interval_length(&self) -> i64 {
            3600
        }

        async fn fetch(&self, day: NaiveDate) -> std::result::Result<Vec<PriceRecord>, SourceError> {
            if day > self.published_until {
                return Ok(Vec::new());
            }
            Ok(hourly_day(self.source.as_str(), day))
        }
    }

    #[tokio::test]
    async fn test_reconciliation_against_sqlite_is_idempotent() {
        let (repo, _dir) = create_test_repository().await;
        let store = Arc::new(repo);
        // 10:00 in Vienna, before publication of tomorrow
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 1, 3, 9, 0, 0).unwrap(),
        ));
        let service = ReconciliationService::new(
            store.clone(),
            clock,
            ReconciliationConfig::default(),
        )
        .with_client(Arc::new(HourlySource {
            source: SourceId::awattar(),
            published_until: date(2024, 1, 3),
        }));

        let first = service
            .run_reconciliation(&SourceId::awattar(), 2)
            .await
            .unwrap();
        assert!(first.is_success());
        assert_eq!(first.records_added, 62);

        let second = service
            .run_reconciliation(&SourceId::awattar(), 2)
            .await
            .unwrap();
        assert_eq!(second.records_added, 0);
        assert!(second.is_success());

        let covered = store
            .distinct_covered_dates(&SourceId::awattar(), Vienna)
            .await
            .unwrap();
        assert_eq!(
            covered.into_iter().collect::<Vec<_>>(),
            vec![date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 3)]
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_repeated_upserts_keep_one_row_per_key_with_last_value(
            batches in proptest::collection::vec(
                proptest::collection::vec((0i64..24, 0u8..5), 0..30),
                1..5,
            ),
        ) {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            let base = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap().timestamp();

            let (changed, stored) = runtime.block_on(async {
                let (repo, _dir) = create_test_repository().await;
                let mut changed = 0;
                for batch in &batches {
                    let records: Vec<PriceRecord> = batch
                        .iter()
                        .map(|(slot, price)| {
                            let start = base + slot * 3600;
                            PriceRecord::new(SourceId::AWATTAR, start, start + 3600, *price as f64, "ct/kWh")
                        })
                        .collect();
                    changed += repo.upsert_merge(&records).await.unwrap();
                }
                let stored = repo
                    .records_in_range(&SourceId::awattar(), base, base + 24 * 3600)
                    .await
                    .unwrap();
                (changed, stored)
            });

            let mut expected: BTreeMap<i64, f64> = BTreeMap::new();
            let mut expected_changes = 0;
            for (slot, price) in batches.iter().flatten() {
                let start = base + slot * 3600;
                if expected.insert(start, *price as f64) != Some(*price as f64) {
                    expected_changes += 1;
                }
            }

            prop_assert_eq!(changed, expected_changes);
            prop_assert_eq!(stored.len(), expected.len());
            for (record, (start, price)) in stored.iter().zip(&expected) {
                prop_assert_eq!(record.start_timestamp, *start);
                prop_assert_eq!(record.price, *price);
            }
            prop_assert!(stored.windows(2).all(|w| w[0].start_timestamp < w[1].start_timestamp));
        }
    }
}
