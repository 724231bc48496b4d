//! Reconciliation passes, one-shot or on a fixed interval.

use std::future::Future;
use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::main_lib::AppState;
use spotprice_core::prices::stats::{coverage_summary, price_stats};
use spotprice_core::prices::{ReconciliationServiceTrait, SourceClient, Timespan};
use spotprice_core::utils::time_utils::local_date_from_utc;

/// Runs a pass immediately and then every `period` until Ctrl-C.
pub async fn run_scheduler(state: Arc<AppState>, period: Duration) {
    let passes = run_until(&state, period, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Could not listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    })
    .await;
    info!("Scheduler stopped after {} passes", passes);
}

/// Runs passes every `period` until `shutdown` completes. Returns the number
/// of passes run. A pass in progress always finishes.
pub async fn run_until<F>(state: &AppState, period: Duration, shutdown: F) -> usize
where
    F: Future<Output = ()>,
{
    let mut sync_interval = interval(period);
    // A slow pass must not trigger a burst of catch-up passes.
    sync_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut passes = 0;
    loop {
        tokio::select! {
            biased;
            _ = sync_interval.tick() => {
                if !run_pass(state).await {
                    warn!("Pass {} finished with failures", passes + 1);
                }
                passes += 1;
            }
            _ = &mut shutdown => {
                info!("Shutdown requested, stopping scheduler");
                break;
            }
        }
    }
    passes
}

/// Runs one reconciliation pass over every source and logs the outcome.
///
/// Returns true if every unit of every source succeeded.
pub async fn run_pass(state: &AppState) -> bool {
    info!("Running reconciliation pass...");
    let mut success = true;

    for result in state.reconciliation_service.run_all().await {
        match result {
            Ok(report) => {
                success &= report.is_success();
                for failed in report.failed_units.iter().chain(&report.parse_failures) {
                    warn!("{} {}: {}", report.source, failed.unit, failed.message);
                }
            }
            Err(e) => {
                success = false;
                error!("Reconciliation failed: {}", e);
            }
        }
    }

    for client in &state.clients {
        log_source_overview(state, client.as_ref()).await;
    }
    success
}

/// Logs today's price statistics and the stored coverage of one source.
async fn log_source_overview(state: &AppState, client: &dyn SourceClient) {
    let source = client.source_id();
    let tz = client.timezone();
    let today = local_date_from_utc(state.clock.now(), tz);

    if let Some((start, end)) = Timespan::Day(today).bounds(tz) {
        match price_stats(state.store.as_ref(), source, start, end).await {
            Ok(stats) => match (stats.min, stats.max, stats.avg) {
                (Some(min), Some(max), Some(avg)) => info!(
                    "{} {}: {} prices, min {:.3}, max {:.3}, avg {:.3}",
                    source, today, stats.records, min.price, max.price, avg
                ),
                _ => info!("{} {}: no prices stored", source, today),
            },
            Err(e) => warn!("{} statistics unavailable: {}", source, e),
        }
    }

    match coverage_summary(state.store.as_ref(), source, tz, today).await {
        Ok(summary) => {
            info!(
                "{} coverage: {} dates, first {:?}, last {:?}",
                source, summary.covered_dates, summary.first_timestamp, summary.last_timestamp
            );
            if !summary.missing_dates.is_empty() {
                debug!("{} missing dates: {:?}", source, summary.missing_dates);
            }
        }
        Err(e) => warn!("{} coverage unavailable: {}", source, e),
    }
}
