//! Database model for spot price records.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use spotprice_core::prices::PriceRecord;

/// Database row of `spot_prices`.
#[derive(
    Queryable,
    Selectable,
    Insertable,
    QueryableByName,
    Debug,
    Clone,
    Serialize,
    Deserialize,
    PartialEq,
)]
#[diesel(table_name = crate::schema::spot_prices)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct SpotPriceDB {
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub source: String,
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub start_timestamp: i64,
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub end_timestamp: i64,
    #[diesel(sql_type = diesel::sql_types::Double)]
    pub price: f64,
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub unit: String,
}

impl From<&PriceRecord> for SpotPriceDB {
    fn from(record: &PriceRecord) -> Self {
        Self {
            source: record.source.clone(),
            start_timestamp: record.start_timestamp,
            end_timestamp: record.end_timestamp,
            price: record.price,
            unit: record.unit.clone(),
        }
    }
}

impl From<SpotPriceDB> for PriceRecord {
    fn from(row: SpotPriceDB) -> Self {
        PriceRecord::new(
            row.source,
            row.start_timestamp,
            row.end_timestamp,
            row.price,
            row.unit,
        )
    }
}
