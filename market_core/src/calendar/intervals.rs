//! Closed-interval normalizer.
//!
//! A closed interval is a half-open UTC window `[start_ms, end_ms)` during which the
//! market is forcibly closed. A normalized collection is sorted by start and pairwise
//! non-overlapping; touching neighbours (`prev.end == next.start`) are kept as-is.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::{CoreError, CoreResult},
    timestamps::{MAX_EPOCH_MS, MIN_EPOCH_MS, MS_PER_DAY},
};

/// Half-open UTC window `[start_ms, end_ms)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(i64, i64)", into = "(i64, i64)")]
pub struct ClosedInterval {
    /// Inclusive start.
    pub start_ms: i64,
    /// Exclusive end.
    pub end_ms: i64,
}

impl ClosedInterval {
    /// Build without validation; see [`normalize_closed_intervals`].
    pub const fn new(start_ms: i64, end_ms: i64) -> Self {
        Self { start_ms, end_ms }
    }

    /// `start <= ts < end`.
    pub const fn contains(&self, ts: i64) -> bool {
        self.start_ms <= ts && ts < self.end_ms
    }
}

impl From<(i64, i64)> for ClosedInterval {
    fn from((start_ms, end_ms): (i64, i64)) -> Self {
        Self { start_ms, end_ms }
    }
}

impl From<ClosedInterval> for (i64, i64) {
    fn from(c: ClosedInterval) -> Self {
        (c.start_ms, c.end_ms)
    }
}

fn check_bound(value: i64, idx: usize, pos: usize) -> CoreResult<()> {
    if !(MIN_EPOCH_MS..=MAX_EPOCH_MS).contains(&value) {
        return Err(CoreError::input(format!(
            "closed_intervals_utc[{idx}][{pos}] is outside the epoch-ms rails: {value}"
        )));
    }
    Ok(())
}

/// Validate, sort by start and reject overlaps.
///
/// Errors ([`CoreError::Input`]):
/// - a bound outside the epoch-ms rails
/// - `start >= end`
/// - any overlap after sorting (touching is allowed)
pub fn normalize_closed_intervals(
    intervals: impl IntoIterator<Item = (i64, i64)>,
) -> CoreResult<Vec<ClosedInterval>> {
    let mut out = Vec::new();
    for (idx, (start_ms, end_ms)) in intervals.into_iter().enumerate() {
        check_bound(start_ms, idx, 0)?;
        check_bound(end_ms, idx, 1)?;
        if start_ms >= end_ms {
            return Err(CoreError::input(format!(
                "closed_intervals_utc[{idx}] needs start_ms < end_ms, got {start_ms} >= {end_ms}"
            )));
        }
        out.push(ClosedInterval::new(start_ms, end_ms));
    }
    out.sort_by_key(|c| c.start_ms);
    for pair in out.windows(2) {
        let (prev, cur) = (pair[0], pair[1]);
        if cur.start_ms < prev.end_ms {
            return Err(CoreError::input(format!(
                "closed_intervals_utc overlap: prev={}..{} cur={}..{}",
                prev.start_ms, prev.end_ms, cur.start_ms, cur.end_ms
            )));
        }
    }
    Ok(out)
}

/// Parse a raw JSON interval list (`[[start, end], ...]`) with strict integer typing.
pub fn closed_intervals_from_json(value: &Value) -> CoreResult<Vec<(i64, i64)>> {
    let items = value
        .as_array()
        .ok_or_else(|| CoreError::input("closed_intervals_utc must be a list"))?;
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let pair = item
                .as_array()
                .ok_or_else(|| CoreError::input(format!("closed_intervals_utc[{idx}] must be a list")))?;
            if pair.len() != 2 {
                return Err(CoreError::input(format!(
                    "closed_intervals_utc[{idx}] must hold exactly 2 values"
                )));
            }
            let bound = |pos: usize| -> CoreResult<i64> {
                match &pair[pos] {
                    Value::Number(n) if n.is_i64() => n.as_i64().ok_or_else(|| {
                        CoreError::input(format!("closed_intervals_utc[{idx}][{pos}] must be int"))
                    }),
                    _ => Err(CoreError::input(format!(
                        "closed_intervals_utc[{idx}][{pos}] must be int"
                    ))),
                }
            };
            Ok((bound(0)?, bound(1)?))
        })
        .collect()
}

/// Turn `YYYY-MM-DD` holiday dates into whole-UTC-day intervals.
pub fn intervals_from_holidays<S: AsRef<str>>(dates: &[S]) -> CoreResult<Vec<(i64, i64)>> {
    dates
        .iter()
        .enumerate()
        .map(|(idx, raw)| {
            let raw = raw.as_ref();
            let day = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map_err(|e| CoreError::input(format!("holidays[{idx}] {raw:?}: {e}")))?;
            let start = day.and_time(NaiveTime::MIN).and_utc().timestamp_millis();
            Ok((start, start + MS_PER_DAY))
        })
        .collect()
}

/// Concatenate lists and drop exact duplicates, keeping first-seen order.
pub(crate) fn dedup_preserving_order(lists: &[&[(i64, i64)]]) -> Vec<(i64, i64)> {
    let mut seen = std::collections::HashSet::new();
    lists
        .iter()
        .flat_map(|l| l.iter().copied())
        .filter(|pair| seen.insert(*pair))
        .collect()
}
