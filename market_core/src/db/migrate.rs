//! Embedded schema migrations for the live archive.

use anyhow::anyhow;
use diesel::{Connection, SqliteConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

/// Embedded Diesel migrations bundled with this crate.
///
/// These are applied by [`run_sqlite`] / [`run_pending`] to bring the archive schema up to date.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Apply pending migrations on an open connection.
pub fn run_pending(conn: &mut SqliteConnection) -> anyhow::Result<()> {
    let applied = conn.run_pending_migrations(MIGRATIONS).map_err(|e| anyhow!(e))?;
    if !applied.is_empty() {
        tracing::info!(count = applied.len(), "archive migrations applied");
    }
    Ok(())
}

/// Runs pending Diesel migrations on a SQLite database at the given path.
pub fn run_sqlite(url: &str) -> anyhow::Result<()> {
    let mut conn = SqliteConnection::establish(url)?;
    run_pending(&mut conn)
}

#[cfg(test)]
mod test {
    use super::*;
    use diesel::connection::SimpleConnection;

    #[test]
    fn migrations_apply_on_temp_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        let path = temp.path().to_string_lossy().to_string();

        run_sqlite(&path).expect("migration run");
        // idempotent
        run_sqlite(&path).expect("second migration run");

        let mut conn = SqliteConnection::establish(&path).unwrap();
        conn.batch_execute(
            "INSERT INTO live_archive_bars \
             (symbol, tf, open_time_ms, close_time_ms, payload_json, ingest_ts_ms) \
             VALUES ('XAUUSD', '1m', 1700000040000, 1700000099999, '{}', 1700000100000)",
        )
        .unwrap();
    }
}
