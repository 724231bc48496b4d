//! Spot price core - domain entities, capabilities and the reconciliation engine.
//!
//! This crate decides which days and intervals of a spot price series are
//! missing and orchestrates fetching and merging them. It is
//! database-agnostic and defines traits that are implemented by the
//! `storage-sqlite` crate.

pub mod constants;
pub mod errors;
pub mod prices;
pub mod utils;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
