//! Diesel models mapping to [`crate::schema::live_archive_bars`].
//!
//! Rows are created once and never updated; there is no changeset type.

use diesel::prelude::*;
use serde::Serialize;
use serde_json::Value;

use crate::schema::live_archive_bars;

/// A stored archive row.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Serialize)]
#[diesel(table_name = live_archive_bars, check_for_backend(diesel::sqlite::Sqlite))]
pub struct ArchivedBar {
    /// Symbol as submitted.
    pub symbol: String,
    /// Canonical timeframe.
    pub tf: String,
    /// Bucket open (epoch ms).
    pub open_time_ms: i64,
    /// Inclusive bucket close (epoch ms).
    pub close_time_ms: i64,
    /// Compact JSON of the submitted bar.
    pub payload_json: String,
    /// When the row was ingested (epoch ms).
    pub ingest_ts_ms: i64,
}

impl ArchivedBar {
    /// Decode the stored payload.
    pub fn payload(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.payload_json)
    }
}

/// Insertable form of [`ArchivedBar`].
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = live_archive_bars)]
pub struct NewArchivedBar<'a> {
    /// Symbol as submitted.
    pub symbol: &'a str,
    /// Canonical timeframe.
    pub tf: &'a str,
    /// Bucket open (epoch ms).
    pub open_time_ms: i64,
    /// Inclusive bucket close (epoch ms).
    pub close_time_ms: i64,
    /// Compact JSON of the submitted bar.
    pub payload_json: &'a str,
    /// Ingest time (epoch ms).
    pub ingest_ts_ms: i64,
}
