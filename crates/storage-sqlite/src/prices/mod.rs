//! SQLite storage implementation for spot price records.

mod model;
mod repository;

pub use model::SpotPriceDB;
pub use repository::SpotPriceRepository;

// Re-export trait from core for convenience
pub use spotprice_core::prices::RecordStore;
