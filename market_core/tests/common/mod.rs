#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::{Integer, Text};
use market_core::db::{connection, migrate};
use serde_json::{Value, json};
use std::path::PathBuf;
use tempfile::TempDir;

#[derive(QueryableByName)]
struct JournalMode {
    #[diesel(sql_type = Text)]
    journal_mode: String,
}
#[derive(QueryableByName)]
struct Synchronous {
    #[diesel(sql_type = Integer)]
    synchronous: i32,
}
#[derive(QueryableByName)]
struct TempStore {
    #[diesel(sql_type = Integer)]
    temp_store: i32,
}
#[derive(QueryableByName)]
struct BusyTimeout {
    #[diesel(sql_type = Integer, column_name = "timeout")]
    busy_timeout: i32,
}

/// 1m-aligned base instant (2023-11-14T22:14:00Z).
pub const T: i64 = 1_700_000_040_000;

pub fn ms(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> i64 {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap().timestamp_millis()
}

/// The overrides file shipped at the workspace root.
pub fn overrides_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../config/calendar_overrides.json")
}

/// A complete 1m bar as upstream collaborators send it.
pub fn raw_bar(open: i64, close: f64) -> Value {
    json!({
        "symbol": "XAU/USD",
        "tf": "1m",
        "open_time_ms": open,
        "close_time_ms": open + 59_999,
        "open": 2000.0,
        "high": 2001.5,
        "low": 1999.25,
        "close": close,
        "volume": 12.0,
        "tick_count": 40,
        "complete": true,
    })
}

pub struct TestDb {
    _dir: TempDir,    // keep alive for the life of the test
    pub path: String, // <tmpdir>/archive.sqlite
}

pub fn setup_db() -> (TestDb, SqliteConnection) {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("archive.sqlite").to_string_lossy().to_string();

    migrate::run_sqlite(&path).expect("migrations");
    let conn = connection::connect_sqlite(&path).expect("connect");
    (TestDb { _dir: dir, path }, conn)
}

pub fn assert_sqlite_pragmas(conn: &mut SqliteConnection) {
    use diesel::sql_query;

    let jm: JournalMode = sql_query("PRAGMA journal_mode;").get_result(conn).unwrap();
    assert_eq!(jm.journal_mode.to_lowercase(), "wal"); // WAL is persistent per DB file

    let sync: Synchronous = sql_query("PRAGMA synchronous;").get_result(conn).unwrap();
    assert_eq!(sync.synchronous, 1); // NORMAL

    let ts: TempStore = sql_query("PRAGMA temp_store;").get_result(conn).unwrap();
    assert_eq!(ts.temp_store, 2); // MEMORY

    let bt: BusyTimeout = sql_query("PRAGMA busy_timeout;").get_result(conn).unwrap();
    assert_eq!(bt.busy_timeout, 5000);
}
