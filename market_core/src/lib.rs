//! Market-time and bar-persistence core for an FX market-data runtime.
//!
//! - [`calendar`]: DST-aware trading calendar (open/pause/next-open, reasons) and
//!   its overrides file.
//! - [`file_cache`]: bounded per-(symbol, tf) store of complete bars, CSV + metadata.
//! - [`live_archive`]: append-only SQLite evidence log keyed by `(symbol, tf, open_time_ms)`.
//!
//! Shared primitives: [`timestamps`] (epoch-ms rails), [`timeframe`], [`bucket`]
//! (bar geometry) and [`bar`] (normalization of incoming bars).

#![warn(missing_docs)]

pub mod atomic;
pub mod bar;
pub mod bucket;
pub mod calendar;
pub mod config;
pub mod db;
pub mod error;
pub mod file_cache;
pub mod live_archive;
pub mod models;
#[allow(missing_docs)]
pub mod schema;
pub mod timeframe;
pub mod timestamps;
pub mod tz;

pub use error::{CoreError, CoreResult};
