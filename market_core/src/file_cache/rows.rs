//! Row-level operations on cached bars: merge, trim and the ordering check.

use std::collections::BTreeMap;

use crate::{
    bar::Bar,
    error::{CoreError, CoreResult},
};

/// Canonical header of the tabular cache file, in column order.
pub const CACHE_COLUMNS: [&str; 10] = [
    "symbol",
    "tf",
    "open_time_ms",
    "close_time_ms",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "tick_count",
];

/// Outcome of folding incoming rows into existing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeOutcome {
    /// Incoming rows whose `open_time_ms` was not present before.
    pub inserted: usize,
    /// Incoming rows that collided with an existing or earlier incoming row.
    pub duplicates: usize,
}

/// Merge `incoming` into `existing`, last writer wins per `open_time_ms`.
/// The result is sorted ascending by `open_time_ms`.
pub fn merge_rows_keep_last(existing: Vec<Bar>, incoming: Vec<Bar>) -> (Vec<Bar>, MergeOutcome) {
    let mut by_open: BTreeMap<i64, Bar> = existing.into_iter().map(|b| (b.open_time_ms, b)).collect();
    let mut outcome = MergeOutcome::default();
    for bar in incoming {
        match by_open.insert(bar.open_time_ms, bar) {
            Some(_) => outcome.duplicates += 1,
            None => outcome.inserted += 1,
        }
    }
    (by_open.into_values().collect(), outcome)
}

/// Keep only the newest `max_bars` rows; returns how many were dropped.
pub fn trim_rows(rows: &mut Vec<Bar>, max_bars: usize) -> usize {
    if rows.len() <= max_bars {
        return 0;
    }
    let trimmed = rows.len() - max_bars;
    rows.drain(..trimmed);
    trimmed
}

/// Rows must be strictly ascending by `open_time_ms`.
pub fn ensure_sorted_unique(rows: &[Bar]) -> CoreResult<()> {
    for pair in rows.windows(2) {
        let (prev, next) = (pair[0].open_time_ms, pair[1].open_time_ms);
        if next == prev {
            return Err(CoreError::contract(format!("duplicate open_time_ms {next}")));
        }
        if next < prev {
            return Err(CoreError::contract(format!(
                "rows not sorted by open_time_ms: {next} after {prev}"
            )));
        }
    }
    Ok(())
}
