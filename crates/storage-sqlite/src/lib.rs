//! SQLite storage implementation for spot price records.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the `RecordStore` trait defined in `spotprice-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - A single-writer actor that serializes every write in an immediate transaction
//! - Database-specific model types (with Diesel derives)
//!
//! # Architecture
//!
//! This crate is the only place in the workspace where Diesel dependencies exist.
//!
//! ```text
//! core (domain, RecordStore)
//!           │
//!           ▼
//!   storage-sqlite (this crate)
//!           │
//!           ▼
//!       SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;

// Repository implementations
pub mod prices;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

pub use prices::SpotPriceRepository;

// Re-export from spotprice-core for convenience
pub use spotprice_core::errors::{DatabaseError, Error, Result};
