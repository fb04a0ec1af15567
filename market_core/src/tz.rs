//! Time zone resolution and local → UTC conversion helpers.
//!
//! What this module provides:
//! - [`resolve_zone`]: resolve an IANA name (or literal `UTC` / `Etc/UTC`) to a
//!   DST-aware [`chrono_tz::Tz`], reporting which lookup succeeded as a [`TzBackend`].
//! - [`from_local_naive_with_policy`]: convert a naive local timestamp to UTC while
//!   choosing how DST gaps and ambiguities are handled via [`DstPolicy`].
//!
//! Notes:
//! - Ambiguous local times happen during “fall back” when a wall time occurs twice.
//! - Nonexistent local times happen during “spring forward” when a wall time is skipped.
//! - Session boundaries are always built as local wall times and converted here. Fixed
//!   UTC offsets are never added, so two Sunday opens a week apart may differ by an hour.
//!
//! Examples
//! - New York “fall back” ambiguity (2024-11-03 01:30 occurs twice):
//!   PreferEarliest -> 05:30Z, PreferLatest -> 06:30Z.

use anyhow::anyhow;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;

/// Which lookup resolved the configured zone name. Purely observational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TzBackend {
    /// Literal `UTC` / `Etc/UTC`.
    #[serde(rename = "utc")]
    Utc,
    /// Exact IANA name match in the compiled zone database.
    #[serde(rename = "zoneinfo")]
    Primary,
    /// Case-insensitive fallback match in the compiled zone database.
    #[serde(rename = "dateutil")]
    Secondary,
    /// Nothing resolved.
    #[serde(rename = "unknown")]
    Unknown,
}

impl TzBackend {
    /// Stable operator-facing label.
    pub const fn as_str(self) -> &'static str {
        match self {
            TzBackend::Utc => "utc",
            TzBackend::Primary => "zoneinfo",
            TzBackend::Secondary => "dateutil",
            TzBackend::Unknown => "unknown",
        }
    }
}

/// Resolve a zone name: literal UTC first, then an exact match, then a
/// case-insensitive match.
///
/// Errors:
/// - The name resolves through none of the lookups.
pub fn resolve_zone(name: &str) -> anyhow::Result<(Tz, TzBackend)> {
    let name = name.trim();
    if name.eq_ignore_ascii_case("UTC") || name == "Etc/UTC" {
        return Ok((Tz::UTC, TzBackend::Utc));
    }
    if let Ok(tz) = name.parse::<Tz>() {
        return Ok((tz, TzBackend::Primary));
    }
    match Tz::from_str_insensitive(name) {
        Ok(tz) => Ok((tz, TzBackend::Secondary)),
        Err(e) => Err(anyhow!("tz does not resolve: {name}: {e}")),
    }
}

/// Policy for handling DST edge cases when converting local naive timestamps to UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DstPolicy {
    /// Strict behavior: error on ambiguous (fall-back) or nonexistent (spring-forward) local times.
    Strict,
    /// For ambiguous local times (two possible instants), pick the earliest instant
    /// (typically the DST occurrence).
    PreferEarliest,
    /// For ambiguous local times (two possible instants), pick the latest instant
    /// (typically the standard-time occurrence).
    PreferLatest,
    /// For nonexistent local times (spring-forward gap), shift forward in one-minute
    /// increments until the first valid instant is found (capped at 2 hours).
    ShiftForward,
    /// `PreferEarliest` for ambiguous times combined with `ShiftForward` for gaps.
    /// Session boundaries use this so every wall time maps to exactly one instant.
    Lenient,
}

/// Convert a naive local timestamp to UTC using a specific IANA time zone and DST policy.
///
/// Behavior:
/// - If the local time maps to a single instant, that instant is returned.
/// - If the local time is ambiguous (fall-back), behavior depends on `policy`:
///   - PreferEarliest/Lenient -> pick the earlier instant
///   - PreferLatest -> pick the later instant
///   - Strict/ShiftForward -> return an error
/// - If the local time is nonexistent (spring-forward gap), behavior depends on `policy`:
///   - ShiftForward/Lenient -> step forward minute-by-minute until a valid instant is found (max 2 hours)
///   - Strict/PreferEarliest/PreferLatest -> return an error
pub fn from_local_naive_with_policy(
    naive: NaiveDateTime,
    tz: Tz,
    policy: DstPolicy,
) -> anyhow::Result<DateTime<Utc>> {
    use chrono::offset::LocalResult::*;
    match tz.from_local_datetime(&naive) {
        Single(dt) => Ok(dt.with_timezone(&Utc)),
        Ambiguous(a, b) => match policy {
            DstPolicy::PreferEarliest | DstPolicy::Lenient => Ok(a.with_timezone(&Utc)),
            DstPolicy::PreferLatest => Ok(b.with_timezone(&Utc)),
            _ => Err(anyhow!("ambiguous local time: {naive}")),
        },
        None => match policy {
            DstPolicy::ShiftForward | DstPolicy::Lenient => {
                let mut t = naive;
                for _ in 0..120 {
                    t += chrono::Duration::minutes(1);
                    if let Single(dt) = tz.from_local_datetime(&t) {
                        return Ok(dt.with_timezone(&Utc));
                    }
                }
                Err(anyhow!("nonexistent local time: {naive}"))
            }
            _ => Err(anyhow!("nonexistent local time: {naive}")),
        },
    }
}
