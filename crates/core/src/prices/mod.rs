//! Spot price reconciliation module.
//!
//! - [`model`] - Price records, coverage windows and reconciliation units
//! - [`types`] - Strong types (`SourceId`)
//! - [`store`] - Storage trait for price records
//! - [`client`] - Source client capability and its provider-backed implementation
//! - [`gaps`] - Whole-date and interior gap detection
//! - [`cutoff`] - Publication cutoff policy
//! - [`reconcile`] - Reconciliation engine and report
//! - [`stats`] - Price statistics and coverage summaries
//! - [`config`] - Reconciliation settings
//!
//! # Architecture
//!
//! ```text
//! ReconciliationService → SourceClient → market-data crate (providers)
//!        ↓       ↓
//!   GapDetector  CutoffPolicy
//!        ↓
//!   RecordStore (DB)
//! ```

pub mod client;
pub mod config;
pub mod cutoff;
pub mod errors;
pub mod gaps;
pub mod model;
pub mod reconcile;
pub mod stats;
pub mod store;
pub mod types;

#[cfg(test)]
mod testing;

pub use client::{ProviderSourceClient, SourceClient};
pub use config::ReconciliationConfig;
pub use cutoff::CutoffPolicy;
pub use errors::SourceError;
pub use model::{CoverageWindow, GapKind, PriceRecord, ReconcileUnit};
pub use reconcile::{
    FailedUnit, FailureKind, ReconciliationReport, ReconciliationService,
    ReconciliationServiceTrait,
};
pub use stats::{CoverageSummary, PricePoint, PriceStats, Timespan};
pub use store::RecordStore;
pub use types::SourceId;
