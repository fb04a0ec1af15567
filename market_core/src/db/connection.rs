//! SQLite connection helpers.
//!
//! Provides [`connect_sqlite`] that opens a connection and applies the archive
//! PRAGMAs: WAL journaling, synchronous=NORMAL, in-memory temp space and a 5000ms
//! busy_timeout.
//!
//! Example:
//! ```no_run
//! use market_core::db::connection::connect_sqlite;
//!
//! let path = std::env::temp_dir().join("market_core_example.sqlite");
//! let _conn = connect_sqlite(path.to_str().unwrap()).expect("open sqlite");
//! ```

use diesel::{Connection, SqliteConnection, connection::SimpleConnection};

/// PRAGMAs applied to every archive connection.
pub const ARCHIVE_PRAGMAS: &str = "PRAGMA journal_mode=WAL;\
     PRAGMA synchronous=NORMAL;\
     PRAGMA temp_store=MEMORY;\
     PRAGMA busy_timeout=5000;";

/// Open a SQLite connection and apply connection-wide PRAGMAs.
pub fn connect_sqlite(database_url: &str) -> anyhow::Result<SqliteConnection> {
    let mut conn = SqliteConnection::establish(database_url)?;
    conn.batch_execute(ARCHIVE_PRAGMAS)?;
    Ok(conn)
}
