//! SQLite-backed [`LiveArchive`] using Diesel.

use std::{fs, path::Path};

use diesel::{dsl::max, prelude::*};
use serde_json::Value;

use crate::{
    db::{connection::connect_sqlite, migrate},
    error::{CoreError, CoreResult},
    live_archive::{InsertResult, InsertStatus, LiveArchive, validate_archive_key},
    models::{ArchivedBar, NewArchivedBar},
    schema::live_archive_bars::dsl as lab,
    timestamps::now_ms,
};

/// Archive stored in one SQLite file.
pub struct SqliteLiveArchive {
    conn: SqliteConnection,
}

impl std::fmt::Debug for SqliteLiveArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteLiveArchive").finish_non_exhaustive()
    }
}

fn db_err(e: impl std::fmt::Display) -> CoreError {
    CoreError::Database(e.to_string())
}

impl SqliteLiveArchive {
    /// Open (or create) the archive at `db_path`: parent directories are created,
    /// PRAGMAs applied and pending migrations run.
    pub fn open(db_path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = db_path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let url = path
            .to_str()
            .ok_or_else(|| CoreError::input(format!("archive path is not UTF-8: {}", path.display())))?;
        let mut conn = connect_sqlite(url).map_err(db_err)?;
        migrate::run_pending(&mut conn).map_err(db_err)?;
        tracing::debug!(db_path = %path.display(), "live archive opened");
        Ok(Self { conn })
    }

    fn try_insert(
        &mut self,
        symbol: &str,
        tf: &str,
        open_ms: i64,
        close_ms: i64,
        payload: &Value,
        ingest_ms: Option<i64>,
    ) -> CoreResult<InsertStatus> {
        let tf = validate_archive_key(symbol, tf, open_ms, close_ms)?;
        let payload_json = serde_json::to_string(payload)?;
        let row = NewArchivedBar {
            symbol,
            tf: tf.as_str(),
            open_time_ms: open_ms,
            close_time_ms: close_ms,
            payload_json: &payload_json,
            ingest_ts_ms: ingest_ms.unwrap_or_else(now_ms),
        };
        let affected = diesel::insert_or_ignore_into(lab::live_archive_bars)
            .values(&row)
            .execute(&mut self.conn)
            .map_err(db_err)?;
        Ok(if affected == 1 { InsertStatus::Inserted } else { InsertStatus::Duplicate })
    }
}

impl LiveArchive for SqliteLiveArchive {
    fn insert_bar(
        &mut self,
        symbol: &str,
        tf: &str,
        open_ms: i64,
        close_ms: i64,
        payload: &Value,
        ingest_ms: Option<i64>,
    ) -> InsertResult {
        match self.try_insert(symbol, tf, open_ms, close_ms, payload, ingest_ms) {
            Ok(status) => InsertResult::ok(status),
            Err(e) => {
                tracing::warn!(symbol, tf, open_ms, error = %e, "live archive insert failed");
                InsertResult::failed(e)
            }
        }
    }

    fn count(&mut self, symbol: &str, tf: &str) -> CoreResult<i64> {
        lab::live_archive_bars
            .filter(lab::symbol.eq(symbol))
            .filter(lab::tf.eq(tf))
            .count()
            .get_result(&mut self.conn)
            .map_err(db_err)
    }

    fn get(&mut self, symbol: &str, tf: &str, open_ms: i64) -> CoreResult<Option<ArchivedBar>> {
        lab::live_archive_bars
            .filter(lab::symbol.eq(symbol))
            .filter(lab::tf.eq(tf))
            .filter(lab::open_time_ms.eq(open_ms))
            .select(ArchivedBar::as_select())
            .first(&mut self.conn)
            .optional()
            .map_err(db_err)
    }

    fn latest_open_time_ms(&mut self, symbol: &str, tf: &str) -> CoreResult<Option<i64>> {
        lab::live_archive_bars
            .filter(lab::symbol.eq(symbol))
            .filter(lab::tf.eq(tf))
            .select(max(lab::open_time_ms))
            .first(&mut self.conn)
            .map_err(db_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const T: i64 = 1_700_000_040_000;

    #[test]
    fn insert_then_duplicate_then_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let mut archive = SqliteLiveArchive::open(dir.path().join("nested/archive.sqlite")).unwrap();
        let payload = json!({"open": 1.0, "complete": false});

        let first = archive.insert_bar("XAUUSD", "1m", T, T + 59_999, &payload, Some(T + 60_000));
        assert_eq!(first, InsertResult::ok(InsertStatus::Inserted));
        let second = archive.insert_bar("XAUUSD", "1m", T, T + 59_999, &json!({"other": 1}), None);
        assert_eq!(second.status, InsertStatus::Duplicate);

        let row = archive.get("XAUUSD", "1m", T).unwrap().unwrap();
        assert_eq!(row.payload().unwrap(), payload);
        assert_eq!(row.payload_json, r#"{"complete":false,"open":1.0}"#);
        assert_eq!(row.ingest_ts_ms, T + 60_000);
        assert_eq!(archive.count("XAUUSD", "1m").unwrap(), 1);
        assert_eq!(archive.latest_open_time_ms("XAUUSD", "1m").unwrap(), Some(T));
        assert_eq!(archive.latest_open_time_ms("XAUUSD", "5m").unwrap(), None);
    }

    #[test]
    fn validation_failures_are_in_band() {
        let dir = tempfile::tempdir().unwrap();
        let mut archive = SqliteLiveArchive::open(dir.path().join("a.sqlite")).unwrap();
        let r = archive.insert_bar("XAUUSD", "1m", T, T, &json!({}), None);
        assert_eq!(r.status, InsertStatus::Failed);
        assert!(r.error.unwrap().contains("close_time_ms"));
        assert_eq!(archive.count("XAUUSD", "1m").unwrap(), 0);
    }
}
