//! Reconciliation engine.
//!
//! A pass runs in two phases against one source:
//!
//! 1. **Whole-date phase**: dates without any record (bounded by the store's
//!    own history plus tomorrow) are fetched and merged, clipped to the local
//!    day.
//! 2. **Interior phase**: after phase 1 has committed, holes inside the
//!    trailing lookback window are resolved to the local dates they touch and
//!    merged, clipped to the hole.
//!
//! Every unit commits on its own. A failing unit is recorded in the report and
//! the pass moves on; the gap persists in the store and the next pass picks it
//! up again.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::time::timeout;

use super::client::SourceClient;
use super::config::ReconciliationConfig;
use super::cutoff::{local_now, CutoffPolicy};
use super::errors::SourceError;
use super::gaps::{dates_in_window, detect_interior_gaps, detect_missing_dates};
use super::model::{CoverageWindow, GapKind, PriceRecord, ReconcileUnit};
use super::store::RecordStore;
use super::types::SourceId;
use crate::errors::{Error, Result};
use crate::utils::time_utils::local_day_bounds_epoch;
use crate::utils::Clock;

const SECONDS_PER_DAY: i64 = 86_400;

// =============================================================================
// Report
// =============================================================================

/// Why a unit did not commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Transient source failure; retried on the next pass.
    Fetch,
    /// Upstream payload no longer matches; needs operator attention.
    Parse,
    /// The store rejected the commit of this unit.
    Store,
    /// The store could not be queried for gaps.
    Discovery,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Fetch => "fetch",
            FailureKind::Parse => "parse",
            FailureKind::Store => "store",
            FailureKind::Discovery => "discovery",
        };
        write!(f, "{}", s)
    }
}

/// A unit that failed during a pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedUnit {
    pub unit: ReconcileUnit,
    pub kind: FailureKind,
    pub message: String,
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub source: SourceId,
    /// Rows inserted or changed in the store.
    pub records_added: usize,
    /// Units that reached the fetch step.
    pub units_attempted: usize,
    /// Units not fetchable yet (cutoff) or no longer fetchable (no history).
    pub skipped_units: usize,
    /// Fetch, store and discovery failures.
    pub failed_units: Vec<FailedUnit>,
    /// Units whose payload could not be parsed; they contributed no records.
    pub parse_failures: Vec<FailedUnit>,
}

impl ReconciliationReport {
    pub fn new(source: SourceId) -> Self {
        Self {
            source,
            records_added: 0,
            units_attempted: 0,
            skipped_units: 0,
            failed_units: Vec::new(),
            parse_failures: Vec::new(),
        }
    }

    /// Check if the pass had no failures of any kind.
    pub fn is_success(&self) -> bool {
        self.failed_units.is_empty() && self.parse_failures.is_empty()
    }

    /// Dates whose fetch or commit failed, ascending and deduplicated.
    pub fn failed_dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self
            .failed_units
            .iter()
            .chain(self.parse_failures.iter())
            .filter_map(|f| f.unit.date())
            .collect();
        dates.sort();
        dates.dedup();
        dates
    }

    pub fn summary(&self) -> String {
        if self.is_success() {
            format!(
                "{}: {} records added over {} units ({} skipped)",
                self.source, self.records_added, self.units_attempted, self.skipped_units
            )
        } else {
            format!(
                "{}: {} records added with {} failed units and {} parse failures",
                self.source,
                self.records_added,
                self.failed_units.len(),
                self.parse_failures.len()
            )
        }
    }
}

// =============================================================================
// Service
// =============================================================================

/// Entry point for reconciliation passes.
#[async_trait]
pub trait ReconciliationServiceTrait: Send + Sync {
    /// Sources with a registered client, ascending.
    fn sources(&self) -> Vec<SourceId>;

    /// Run one pass for `source`.
    ///
    /// Only an unknown source is an error. Unit failures, including failed
    /// store queries, are reported in the returned report.
    async fn run_reconciliation(
        &self,
        source: &SourceId,
        lookback_days: u32,
    ) -> Result<ReconciliationReport>;

    /// Run one pass for every registered source with the configured lookback.
    async fn run_all(&self) -> Vec<Result<ReconciliationReport>>;
}

/// Reconciliation engine over one store and a set of source clients.
pub struct ReconciliationService {
    store: Arc<dyn RecordStore>,
    clients: BTreeMap<SourceId, Arc<dyn SourceClient>>,
    clock: Arc<dyn Clock>,
    config: ReconciliationConfig,
}

/// Mutable state of one pass.
struct Pass<'a> {
    client: &'a dyn SourceClient,
    now_local: NaiveDateTime,
    policy: CutoffPolicy,
    /// Successful fetches of this pass, empty results included.
    fetched: HashMap<NaiveDate, Vec<PriceRecord>>,
    /// Dates that failed to fetch or commit in this pass.
    failed_dates: HashSet<NaiveDate>,
    report: ReconciliationReport,
}

impl<'a> Pass<'a> {
    fn new(client: &'a dyn SourceClient, now_local: NaiveDateTime, policy: CutoffPolicy) -> Self {
        Self {
            client,
            now_local,
            policy,
            fetched: HashMap::new(),
            failed_dates: HashSet::new(),
            report: ReconciliationReport::new(client.source_id().clone()),
        }
    }

    fn today(&self) -> NaiveDate {
        self.now_local.date()
    }

    fn is_eligible(&self, date: NaiveDate) -> bool {
        if !self.policy.is_fetchable(date, self.now_local) {
            return false;
        }
        self.client.supports_history() || date >= self.today()
    }

    fn fail(&mut self, unit: ReconcileUnit, kind: FailureKind, message: String) {
        if let Some(date) = unit.date() {
            self.failed_dates.insert(date);
        }
        let failed = FailedUnit {
            unit,
            kind,
            message,
        };
        match kind {
            FailureKind::Parse => self.report.parse_failures.push(failed),
            _ => self.report.failed_units.push(failed),
        }
    }
}

impl ReconciliationService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        clock: Arc<dyn Clock>,
        config: ReconciliationConfig,
    ) -> Self {
        Self {
            store,
            clients: BTreeMap::new(),
            clock,
            config,
        }
    }

    /// Registers a client under its source id, replacing any previous one.
    pub fn register(&mut self, client: Arc<dyn SourceClient>) {
        self.clients.insert(client.source_id().clone(), client);
    }

    pub fn with_client(mut self, client: Arc<dyn SourceClient>) -> Self {
        self.register(client);
        self
    }

    pub fn config(&self) -> &ReconciliationConfig {
        &self.config
    }

    /// Bounds a store call with the configured store timeout.
    async fn store_call<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send,
    {
        let limit = self.config.store_timeout();
        match timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(limit)),
        }
    }

    /// Fetches one day, turning an elapsed fetch timeout into a fetch error.
    async fn fetch_day(
        &self,
        client: &dyn SourceClient,
        date: NaiveDate,
    ) -> std::result::Result<Vec<PriceRecord>, SourceError> {
        let limit = self.config.fetch_timeout();
        match timeout(limit, client.fetch(date)).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::fetch(
                client.source_id().as_str(),
                format!("no response for {} within {:?}", date, limit),
            )),
        }
    }

    // -------------------------------------------------------------------------
    // Phase 1: whole dates
    // -------------------------------------------------------------------------

    async fn reconcile_whole_dates(&self, pass: &mut Pass<'_>) {
        let source = pass.client.source_id().clone();
        let tz = pass.client.timezone();

        let missing = match self
            .store_call(detect_missing_dates(
                self.store.as_ref(),
                &source,
                tz,
                pass.today(),
            ))
            .await
        {
            Ok(missing) => missing,
            Err(e) => {
                error!("Whole-date discovery failed for {}: {}", source, e);
                pass.fail(
                    ReconcileUnit::Discovery {
                        kind: GapKind::WholeDate,
                    },
                    FailureKind::Discovery,
                    e.to_string(),
                );
                return;
            }
        };

        debug!("{}: {} missing dates", source, missing.len());

        for date in missing {
            if !pass.is_eligible(date) {
                debug!("{}: {} is not fetchable yet, skipping", source, date);
                pass.report.skipped_units += 1;
                continue;
            }
            let (start, end) = local_day_bounds_epoch(date, tz);
            let day = CoverageWindow::new(start, end - 1);
            self.process_unit(pass, ReconcileUnit::Date { date }, date, day)
                .await;
        }
    }

    // -------------------------------------------------------------------------
    // Phase 2: interior gaps
    // -------------------------------------------------------------------------

    async fn reconcile_interior_gaps(&self, pass: &mut Pass<'_>, now_ts: i64, lookback_days: u32) {
        let source = pass.client.source_id().clone();
        let tz = pass.client.timezone();
        let window_end = now_ts;
        let window_start = now_ts - i64::from(lookback_days) * SECONDS_PER_DAY;

        if window_end <= window_start {
            return;
        }

        let gaps = match self
            .store_call(detect_interior_gaps(
                self.store.as_ref(),
                &source,
                window_start,
                window_end,
                pass.client.interval_length(),
            ))
            .await
        {
            Ok(gaps) => gaps,
            Err(e) => {
                error!("Interior gap discovery failed for {}: {}", source, e);
                pass.fail(
                    ReconcileUnit::Discovery {
                        kind: GapKind::Interior,
                    },
                    FailureKind::Discovery,
                    e.to_string(),
                );
                return;
            }
        };

        debug!("{}: {} interior gaps in lookback window", source, gaps.len());

        for gap in gaps {
            for date in dates_in_window(&gap, tz) {
                if pass.failed_dates.contains(&date) {
                    debug!("{}: {} already failed in this pass", source, date);
                    continue;
                }
                if !pass.is_eligible(date) {
                    pass.report.skipped_units += 1;
                    continue;
                }
                self.process_unit(pass, ReconcileUnit::Window { date, window: gap }, date, gap)
                    .await;
            }
        }
    }

    // -------------------------------------------------------------------------
    // Unit processing
    // -------------------------------------------------------------------------

    /// Fetch (at most once per pass), clip to `clip` and commit one unit.
    async fn process_unit(
        &self,
        pass: &mut Pass<'_>,
        unit: ReconcileUnit,
        date: NaiveDate,
        clip: CoverageWindow,
    ) {
        let source = pass.client.source_id().clone();
        pass.report.units_attempted += 1;

        if !pass.fetched.contains_key(&date) {
            match self.fetch_day(pass.client, date).await {
                Ok(records) => {
                    pass.fetched.insert(date, records);
                }
                Err(e) if e.is_parse() => {
                    error!("{}: unusable payload for {}: {}", source, unit, e);
                    pass.fail(unit, FailureKind::Parse, e.message().to_string());
                    return;
                }
                Err(e) => {
                    warn!("{}: fetch failed for {}: {}", source, unit, e);
                    pass.fail(unit, FailureKind::Fetch, e.message().to_string());
                    return;
                }
            }
        }

        let clipped: Vec<PriceRecord> = match pass.fetched.get(&date) {
            Some(records) if !records.is_empty() => records
                .iter()
                .filter(|r| r.source == source.as_str() && clip.contains(r.start_timestamp))
                .cloned()
                .collect(),
            _ => {
                debug!("{}: nothing published for {} yet", source, date);
                return;
            }
        };

        if clipped.is_empty() {
            debug!("{}: no records inside {}", source, unit);
            return;
        }

        match self.store_call(self.store.upsert_merge(&clipped)).await {
            Ok(written) => {
                pass.report.records_added += written;
                debug!(
                    "{}: merged {} records for {} ({} changed)",
                    source,
                    clipped.len(),
                    unit,
                    written
                );
            }
            Err(e) => {
                error!("{}: failed to store {}: {}", source, unit, e);
                pass.fail(unit, FailureKind::Store, e.to_string());
            }
        }
    }
}

#[async_trait]
impl ReconciliationServiceTrait for ReconciliationService {
    fn sources(&self) -> Vec<SourceId> {
        self.clients.keys().cloned().collect()
    }

    async fn run_reconciliation(
        &self,
        source: &SourceId,
        lookback_days: u32,
    ) -> Result<ReconciliationReport> {
        let client = self
            .clients
            .get(source)
            .cloned()
            .ok_or_else(|| Error::UnknownSource(source.to_string()))?;

        let now = self.clock.now();
        let now_local = local_now(now, client.timezone());
        let mut pass = Pass::new(
            client.as_ref(),
            now_local,
            self.config.cutoff_policy_for(client.publication_hour()),
        );

        debug!(
            "Reconciling {} at {} local, lookback {} days",
            source, now_local, lookback_days
        );

        self.reconcile_whole_dates(&mut pass).await;
        self.reconcile_interior_gaps(&mut pass, now.timestamp(), lookback_days)
            .await;

        let report = pass.report;
        if report.is_success() {
            info!("Reconciled {}", report.summary());
        } else {
            warn!("Reconciled {}", report.summary());
        }
        Ok(report)
    }

    async fn run_all(&self) -> Vec<Result<ReconciliationReport>> {
        let mut reports = Vec::with_capacity(self.clients.len());
        for source in self.sources() {
            reports.push(
                self.run_reconciliation(&source, self.config.lookback_days)
                    .await,
            );
        }
        reports
    }
}
