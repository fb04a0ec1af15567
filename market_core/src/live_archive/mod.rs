//! LiveArchive: append-only evidence of every bar seen, complete or not.
//!
//! One row per `(symbol, tf, open_time_ms)`. Inserts never overwrite: a second
//! insert of the same key reports [`InsertStatus::Duplicate`]. Insert failures are
//! reported in-band through [`InsertResult`] rather than as errors, so a caller
//! fanning a bar out to several sinks never aborts on the archive.

pub mod sqlite;

use serde::Serialize;
use serde_json::Value;

pub use sqlite::SqliteLiveArchive;

use crate::{
    bucket::validate_geometry,
    error::{CoreError, CoreResult},
    models::ArchivedBar,
    timeframe::Timeframe,
    timestamps::require_epoch_ms,
};

/// Outcome class of one insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InsertStatus {
    /// A new row was stored.
    Inserted,
    /// The key already existed; nothing changed.
    Duplicate,
    /// Validation or the storage engine rejected the row.
    Failed,
}

/// Status plus the failure reason, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertResult {
    /// Outcome class.
    pub status: InsertStatus,
    /// Human-readable reason when `status == Failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InsertResult {
    pub(crate) fn ok(status: InsertStatus) -> Self {
        Self { status, error: None }
    }

    pub(crate) fn failed(error: impl ToString) -> Self {
        Self { status: InsertStatus::Failed, error: Some(error.to_string()) }
    }
}

/// Portable archive surface; the SQLite implementation lives in `sqlite.rs`.
pub trait LiveArchive {
    /// Store one bar keyed by `(symbol, tf, open_ms)` unless the key already exists.
    /// `ingest_ms` defaults to the host clock.
    fn insert_bar(
        &mut self,
        symbol: &str,
        tf: &str,
        open_ms: i64,
        close_ms: i64,
        payload: &Value,
        ingest_ms: Option<i64>,
    ) -> InsertResult;

    /// Number of rows stored for `(symbol, tf)`.
    fn count(&mut self, symbol: &str, tf: &str) -> CoreResult<i64>;

    /// The stored row for a key, if any.
    fn get(&mut self, symbol: &str, tf: &str, open_ms: i64) -> CoreResult<Option<ArchivedBar>>;

    /// Newest `open_time_ms` stored for `(symbol, tf)`. Advisory only.
    fn latest_open_time_ms(&mut self, symbol: &str, tf: &str) -> CoreResult<Option<i64>>;
}

/// Key checks shared by every archive backend.
pub fn validate_archive_key(symbol: &str, tf: &str, open_ms: i64, close_ms: i64) -> CoreResult<Timeframe> {
    if symbol.trim().is_empty() {
        return Err(CoreError::input("symbol must be non-empty"));
    }
    let tf = Timeframe::from_canonical(tf)
        .ok_or_else(|| CoreError::contract(format!("unsupported tf: {tf:?}")))?;
    require_epoch_ms(open_ms, "open_time_ms")?;
    validate_geometry(tf, open_ms, close_ms)?;
    Ok(tf)
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: i64 = 1_700_000_040_000;

    #[test]
    fn key_validation() {
        assert_eq!(validate_archive_key("XAUUSD", "1m", T, T + 59_999).unwrap(), Timeframe::M1);
        assert!(validate_archive_key(" ", "1m", T, T + 59_999).is_err());
        // aliases are not canonical
        assert!(validate_archive_key("XAUUSD", "m1", T, T + 59_999).is_err());
        assert!(validate_archive_key("XAUUSD", "1m", T, T).is_err());
        assert!(validate_archive_key("XAUUSD", "1m", T + 1, T + 60_000).is_err());
        assert!(validate_archive_key("XAUUSD", "1m", 1_700_000_040, 1_700_000_040 + 59_999).is_err());
    }

    #[test]
    fn result_serializes_status_codes() {
        let ok = serde_json::to_value(InsertResult::ok(InsertStatus::Duplicate)).unwrap();
        assert_eq!(ok, serde_json::json!({"status": "DUPLICATE"}));
        let failed = serde_json::to_value(InsertResult::failed("boom")).unwrap();
        assert_eq!(failed, serde_json::json!({"status": "FAILED", "error": "boom"}));
    }
}
