//! Database utilities for the live archive: connections and schema migrations.
//!
//! - [`connection::connect_sqlite`] applies WAL, synchronous=NORMAL, temp_store=MEMORY
//!   and a 5000ms busy_timeout.
//! - [`migrate::run_sqlite`] / [`migrate::run_pending`] apply the embedded migrations.
//!
//! Example:
//! ```no_run
//! use market_core::db::{connection, migrate};
//!
//! let db_path = std::env::temp_dir().join("market_core_example.sqlite");
//! migrate::run_sqlite(db_path.to_str().unwrap()).expect("migrations");
//! let _conn = connection::connect_sqlite(db_path.to_str().unwrap()).expect("connect");
//! ```

pub mod connection;
pub mod migrate;
