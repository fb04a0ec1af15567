//! TradingCalendar: the DST-aware weekly schedule folded with closed intervals.
//!
//! Schedule (local time of the resolved zone):
//! - Saturday: closed.
//! - Sunday: closed until `weekly_open`, then open.
//! - Friday: open until `weekly_close`, then closed.
//! - Mon–Thu: open except `[daily_break_start, +daily_break_minutes)`. A break that
//!   runs past local midnight also closes the start of the next day.
//! - A closed interval `[start, end)` closes the market regardless of the above.
//!
//! Boundaries are built as local wall times and converted with [`DstPolicy::Lenient`].
//! Each local day yields open sub-intervals; adjacent sub-intervals are merged into
//! open *runs* across midnight, and closed intervals are cut out of the runs.
//! `next_open` returns run starts and `next_pause` returns run ends.
//!
//! Query methods never fail. A broken configuration is recorded once at
//! construction ([`TradingCalendar::health_error`]) and every query degrades:
//! `is_open` is `false`, `next_open`/`next_pause` return their input, and
//! `explain` reports [`ClosedReason::CalendarError`].

use std::path::Path;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use chrono_tz::Tz;
use serde::Serialize;

use crate::{
    calendar::{
        intervals::{ClosedInterval, dedup_preserving_order, normalize_closed_intervals},
        overrides::{CalendarOverrides, load_calendar_overrides, parse_hhmm},
    },
    error::CoreResult,
    timestamps::{MS_PER_DAY, ms_to_utc, to_utc_iso, utc_to_ms},
    tz::{DstPolicy, TzBackend, from_local_naive_with_policy, resolve_zone},
};

/// Days of open runs computed around an anchor (one day back, nine ahead).
const WINDOW_DAYS_BACK: i64 = 1;
const WINDOW_DAYS_AHEAD: i64 = 9;
/// Anchor advance when a window has no run start; smaller than the window.
const HOP_MS: i64 = 7 * MS_PER_DAY;
/// Upper bound on hops while searching past long closed intervals.
const MAX_HOPS: usize = 60;

/// Construction parameters a caller may set without an overrides profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarSettings {
    /// IANA zone name or `UTC`.
    pub tz_name: String,
    /// Sunday open, local `HH:MM`.
    pub weekly_open: String,
    /// Friday close, local `HH:MM`.
    pub weekly_close: String,
    /// Mon–Thu break start, local `HH:MM`.
    pub daily_break_start: String,
    /// Break length in minutes.
    pub daily_break_minutes: i64,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            tz_name: "America/New_York".to_string(),
            weekly_open: "17:00".to_string(),
            weekly_close: "17:00".to_string(),
            daily_break_start: "17:00".to_string(),
            daily_break_minutes: 5,
        }
    }
}

impl From<&CalendarOverrides> for CalendarSettings {
    fn from(o: &CalendarOverrides) -> Self {
        Self {
            tz_name: o.tz_name.clone(),
            weekly_open: o.weekly_open.clone(),
            weekly_close: o.weekly_close.clone(),
            daily_break_start: o.daily_break_start.clone(),
            daily_break_minutes: o.daily_break_minutes,
        }
    }
}

/// Why the market is closed at an instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosedReason {
    /// Inside a configured closed interval.
    ClosedInterval,
    /// Saturday, Sunday before the weekly open, or Friday after the weekly close.
    WeekendClosed,
    /// Inside the Mon–Thu daily break.
    DailyBreak,
    /// The calendar failed to initialize.
    CalendarError,
}

impl ClosedReason {
    /// Stable reason code.
    pub const fn as_str(self) -> &'static str {
        match self {
            ClosedReason::ClosedInterval => "closed_interval",
            ClosedReason::WeekendClosed => "weekend_closed",
            ClosedReason::DailyBreak => "daily_break",
            ClosedReason::CalendarError => "calendar_error",
        }
    }
}

/// Snapshot of the market at one instant, as published to status consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketState {
    /// Open at the queried instant.
    pub is_open: bool,
    /// `next_open` as `YYYY-MM-DDTHH:MM:SSZ`.
    pub next_open_utc: String,
    /// `next_pause` as `YYYY-MM-DDTHH:MM:SSZ`.
    pub next_pause_utc: String,
    /// Profile identifier.
    pub calendar_tag: String,
    /// Which zone lookup succeeded.
    pub tz_backend: TzBackend,
}

/// Immutable trading calendar. Build once, share by reference (or through
/// [`crate::calendar::CalendarHandle`] when it must be replaced at runtime).
#[derive(Debug, Clone)]
pub struct TradingCalendar {
    calendar_tag: String,
    tz_name: String,
    tz: Tz,
    tz_backend: TzBackend,
    weekly_open: NaiveTime,
    weekly_close: NaiveTime,
    break_start: NaiveTime,
    break_minutes: i64,
    closed: Vec<ClosedInterval>,
    init_error: Option<String>,
}

impl TradingCalendar {
    /// Build a calendar. When `overrides` is given its fields replace `calendar_tag`
    /// and `settings`, and its closed intervals are appended to `closed_intervals_utc`
    /// (exact duplicates dropped, first occurrence kept).
    ///
    /// Never fails: problems are recorded in [`Self::health_error`].
    pub fn new(
        closed_intervals_utc: &[(i64, i64)],
        calendar_tag: impl Into<String>,
        settings: CalendarSettings,
        overrides: Option<&CalendarOverrides>,
    ) -> Self {
        let (tag, settings, extra) = match overrides {
            Some(o) => (
                o.calendar_tag.clone(),
                CalendarSettings::from(o),
                o.closed_intervals_utc.as_slice(),
            ),
            None => (calendar_tag.into(), settings, &[][..]),
        };

        let mut errors: Vec<String> = Vec::new();

        let (tz, tz_backend) = match resolve_zone(&settings.tz_name) {
            Ok(found) => found,
            Err(e) => {
                errors.push(e.to_string());
                (Tz::UTC, TzBackend::Unknown)
            }
        };

        let mut hhmm = |field: &str, value: &str| match parse_hhmm(value) {
            Ok(t) => t,
            Err(e) => {
                errors.push(format!("{field}: {e}"));
                NaiveTime::MIN
            }
        };
        let weekly_open = hhmm("weekly_open", &settings.weekly_open);
        let weekly_close = hhmm("weekly_close", &settings.weekly_close);
        let break_start = hhmm("daily_break_start", &settings.daily_break_start);

        if settings.daily_break_minutes <= 0 {
            errors.push(format!(
                "daily_break_minutes must be > 0, got {}",
                settings.daily_break_minutes
            ));
        }

        let merged = dedup_preserving_order(&[closed_intervals_utc, extra]);
        let closed = match normalize_closed_intervals(merged) {
            Ok(list) => list,
            Err(e) => {
                errors.push(format!("closed_intervals_utc: {e}"));
                Vec::new()
            }
        };

        let init_error = (!errors.is_empty()).then(|| errors.join("; "));
        if let Some(err) = &init_error {
            tracing::warn!(calendar_tag = %tag, error = %err, "calendar init_error");
        } else {
            tracing::debug!(
                calendar_tag = %tag,
                tz = %settings.tz_name,
                tz_backend = tz_backend.as_str(),
                closed_intervals = closed.len(),
                "calendar ready"
            );
        }

        Self {
            calendar_tag: tag,
            tz_name: settings.tz_name,
            tz,
            tz_backend,
            weekly_open,
            weekly_close,
            break_start,
            break_minutes: settings.daily_break_minutes.max(0),
            closed,
            init_error,
        }
    }

    /// Build directly from one overrides profile.
    pub fn from_overrides(overrides: &CalendarOverrides) -> Self {
        Self::new(&[], overrides.calendar_tag.clone(), CalendarSettings::default(), Some(overrides))
    }

    /// Load profile `tag` from an overrides file and build from it.
    /// Loader errors propagate; the calendar itself never fails.
    pub fn from_overrides_file(path: impl AsRef<Path>, tag: &str) -> CoreResult<Self> {
        let profile = load_calendar_overrides(path, tag)?;
        Ok(Self::from_overrides(&profile))
    }

    /// Profile identifier.
    pub fn calendar_tag(&self) -> &str {
        &self.calendar_tag
    }

    /// Configured zone name.
    pub fn tz_name(&self) -> &str {
        &self.tz_name
    }

    /// Which zone lookup succeeded.
    pub fn tz_backend(&self) -> TzBackend {
        self.tz_backend
    }

    /// Normalized closed intervals in effect.
    pub fn closed_intervals(&self) -> &[ClosedInterval] {
        &self.closed
    }

    /// The initialization error, if the calendar is broken.
    pub fn health_error(&self) -> Option<&str> {
        self.init_error.as_deref()
    }

    // ---------- schedule primitives ----------

    fn local_datetime(&self, ts: i64) -> Option<NaiveDateTime> {
        ms_to_utc(ts).map(|dt| dt.with_timezone(&self.tz).naive_local())
    }

    fn local_to_ms(&self, naive: NaiveDateTime) -> Option<i64> {
        from_local_naive_with_policy(naive, self.tz, DstPolicy::Lenient)
            .ok()
            .map(utc_to_ms)
    }

    fn closed_containing(&self, ts: i64) -> Option<&ClosedInterval> {
        let idx = self.closed.partition_point(|c| c.end_ms <= ts);
        self.closed.get(idx).filter(|c| c.contains(ts))
    }

    fn has_daily_break(day: Weekday) -> bool {
        matches!(day, Weekday::Mon | Weekday::Tue | Weekday::Wed | Weekday::Thu)
    }

    fn break_bounds(&self, date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
        let start = date.and_time(self.break_start);
        (start, start + Duration::minutes(self.break_minutes))
    }

    /// Open sub-intervals of one local date, as naive local times.
    fn open_intervals_local(&self, date: NaiveDate) -> Vec<(NaiveDateTime, NaiveDateTime)> {
        let sod = date.and_time(NaiveTime::MIN);
        let Some(eod) = date.succ_opt().map(|d| d.and_time(NaiveTime::MIN)) else {
            return Vec::new();
        };
        let raw = match date.weekday() {
            Weekday::Sat => Vec::new(),
            Weekday::Sun => vec![(date.and_time(self.weekly_open), eod)],
            Weekday::Fri => vec![(sod, date.and_time(self.weekly_close))],
            _ => {
                let (bs, be) = self.break_bounds(date);
                vec![(sod, bs), (be, eod)]
            }
        };
        // previous day's break spilling past midnight
        let spill = date
            .pred_opt()
            .filter(|prev| Self::has_daily_break(prev.weekday()))
            .map(|prev| self.break_bounds(prev).1)
            .filter(|end| *end > sod);

        raw.into_iter()
            .map(|(s, e)| (spill.map_or(s, |x| s.max(x)), e))
            .filter(|(s, e)| s < e)
            .collect()
    }

    /// Open sub-intervals of one local date in UTC ms.
    fn open_intervals_utc(&self, date: NaiveDate) -> Vec<(i64, i64)> {
        self.open_intervals_local(date)
            .into_iter()
            .filter_map(|(s, e)| Some((self.local_to_ms(s)?, self.local_to_ms(e)?)))
            .filter(|(s, e)| s < e)
            .collect()
    }

    /// Schedule-only check (closed intervals ignored).
    fn schedule_open(&self, ts: i64) -> bool {
        self.local_datetime(ts).is_some_and(|local| {
            self.open_intervals_utc(local.date())
                .iter()
                .any(|&(s, e)| s <= ts && ts < e)
        })
    }

    /// Open runs over the local days around `anchor`: sub-intervals merged across
    /// midnight, minus closed intervals. Sorted and disjoint.
    fn open_runs_around(&self, anchor: i64) -> Vec<(i64, i64)> {
        let Some(local) = self.local_datetime(anchor) else {
            return Vec::new();
        };
        let first = local.date() - Duration::days(WINDOW_DAYS_BACK);

        let mut merged: Vec<(i64, i64)> = Vec::new();
        for offset in 0..=(WINDOW_DAYS_BACK + WINDOW_DAYS_AHEAD) {
            let date = first + Duration::days(offset);
            for (s, e) in self.open_intervals_utc(date) {
                match merged.last_mut() {
                    Some(last) if s <= last.1 => last.1 = last.1.max(e),
                    _ => merged.push((s, e)),
                }
            }
        }
        self.subtract_closed(merged)
    }

    fn subtract_closed(&self, runs: Vec<(i64, i64)>) -> Vec<(i64, i64)> {
        let mut out = Vec::with_capacity(runs.len());
        for (mut start, end) in runs {
            let first = self.closed.partition_point(|c| c.end_ms <= start);
            for c in &self.closed[first..] {
                if c.start_ms >= end || start >= end {
                    break;
                }
                if c.start_ms > start {
                    out.push((start, c.start_ms));
                }
                start = start.max(c.end_ms);
            }
            if start < end {
                out.push((start, end));
            }
        }
        out
    }

    // ---------- queries ----------

    /// `true` when the market is open at `ts`.
    pub fn is_open(&self, ts: i64) -> bool {
        if self.init_error.is_some() || self.closed_containing(ts).is_some() {
            return false;
        }
        self.schedule_open(ts)
    }

    /// Earliest run start `>= ts`. Inclusive at a run start; from strictly inside a
    /// run this is the start of the following run. A closed interval containing `ts`
    /// is skipped first. Returns `ts` when broken or nothing is found.
    pub fn next_open(&self, ts: i64) -> i64 {
        if self.init_error.is_some() {
            return ts;
        }
        let mut anchor = self.closed_containing(ts).map_or(ts, |c| c.end_ms);
        for _ in 0..MAX_HOPS {
            let runs = self.open_runs_around(anchor);
            if runs.is_empty() && self.local_datetime(anchor).is_none() {
                break;
            }
            if let Some(&(start, _)) = runs.iter().find(|(s, _)| *s >= anchor) {
                return start;
            }
            anchor += HOP_MS;
        }
        tracing::warn!(calendar_tag = %self.calendar_tag, ts, "next_open not found");
        ts
    }

    /// The next open→closed transition: the end of the run containing `ts`, or, when
    /// closed, the end of the run starting at `next_open(ts)`. Returns `ts` when broken.
    pub fn next_pause(&self, ts: i64) -> i64 {
        if self.init_error.is_some() {
            return ts;
        }
        if self.is_open(ts) {
            return self
                .open_runs_around(ts)
                .into_iter()
                .find(|&(s, e)| s <= ts && ts < e)
                .map_or(ts, |(_, e)| e);
        }
        let open = self.next_open(ts);
        self.open_runs_around(open)
            .into_iter()
            .find(|&(s, _)| s == open)
            .map_or(ts, |(_, e)| e)
    }

    /// Reason codes for `ts`; empty when open.
    pub fn explain(&self, ts: i64) -> Vec<ClosedReason> {
        if self.init_error.is_some() {
            return vec![ClosedReason::CalendarError];
        }
        let mut reasons = Vec::new();
        if self.closed_containing(ts).is_some() {
            reasons.push(ClosedReason::ClosedInterval);
        }
        if self.schedule_open(ts) {
            return reasons;
        }
        let Some(local) = self.local_datetime(ts) else {
            return reasons;
        };
        let t = local.time();
        let weekend = match local.weekday() {
            Weekday::Sat => true,
            Weekday::Sun => t < self.weekly_open,
            Weekday::Fri => t >= self.weekly_close,
            _ => false,
        };
        reasons.push(if weekend {
            ClosedReason::WeekendClosed
        } else {
            ClosedReason::DailyBreak
        });
        reasons
    }

    /// Status snapshot with ISO-8601 UTC boundaries.
    pub fn market_state(&self, ts: i64) -> MarketState {
        MarketState {
            is_open: self.is_open(ts),
            next_open_utc: to_utc_iso(self.next_open(ts)),
            next_pause_utc: to_utc_iso(self.next_pause(ts)),
            calendar_tag: self.calendar_tag.clone(),
            tz_backend: self.tz_backend,
        }
    }

    /// Last instant of trading at or before `ts`: `next_pause - 1` while open,
    /// otherwise the end of the latest run that finished by `ts`, minus one ms.
    pub fn last_trading_close_ms(&self, ts: i64) -> i64 {
        if self.init_error.is_some() {
            return ts;
        }
        if self.is_open(ts) {
            return self.next_pause(ts) - 1;
        }
        self.open_runs_around(ts - 7 * MS_PER_DAY)
            .into_iter()
            .rev()
            .find(|&(_, e)| e <= ts)
            .map_or(ts, |(_, e)| e - 1)
    }

    /// Most recent local `daily_break_start` at or before `ts` (the 1d bar boundary).
    pub fn trading_day_boundary_for(&self, ts: i64) -> i64 {
        if self.init_error.is_some() {
            return ts;
        }
        let Some(local) = self.local_datetime(ts) else {
            return ts;
        };
        let today = local.date();
        let Some(boundary) = self.local_to_ms(today.and_time(self.break_start)) else {
            return ts;
        };
        if ts >= boundary {
            return boundary;
        }
        today
            .pred_opt()
            .and_then(|d| self.local_to_ms(d.and_time(self.break_start)))
            .unwrap_or(ts)
    }

    /// First local `daily_break_start` strictly after `ts`.
    pub fn next_trading_day_boundary_ms(&self, ts: i64) -> i64 {
        if self.init_error.is_some() {
            return ts;
        }
        let Some(local) = self.local_datetime(ts) else {
            return ts;
        };
        let today = local.date();
        let Some(boundary) = self.local_to_ms(today.and_time(self.break_start)) else {
            return ts;
        };
        if ts < boundary {
            return boundary;
        }
        today
            .succ_opt()
            .and_then(|d| self.local_to_ms(d.and_time(self.break_start)))
            .unwrap_or(ts)
    }

    /// Maintenance gate: always allowed unless restricted to closed markets.
    pub fn is_repair_window(&self, now_ms: i64, safe_only_when_market_closed: bool) -> bool {
        !safe_only_when_market_closed || !self.is_open(now_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn ms(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> i64 {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap().timestamp_millis()
    }

    fn ny() -> TradingCalendar {
        TradingCalendar::new(&[], "ny", CalendarSettings::default(), None)
    }

    fn utc_profile() -> TradingCalendar {
        TradingCalendar::new(
            &[],
            "utc",
            CalendarSettings {
                tz_name: "UTC".into(),
                weekly_open: "23:01".into(),
                weekly_close: "21:45".into(),
                daily_break_start: "22:00".into(),
                daily_break_minutes: 61,
            },
            None,
        )
    }

    #[test]
    fn daily_break_boundaries() {
        let cal = ny();
        assert!(cal.is_open(ms(2026, 1, 20, 21, 59)));
        assert!(!cal.is_open(ms(2026, 1, 20, 22, 0)));
        assert!(!cal.is_open(ms(2026, 1, 20, 22, 4)));
        assert!(cal.is_open(ms(2026, 1, 20, 22, 5)));
        assert_eq!(cal.explain(ms(2026, 1, 20, 22, 2)), vec![ClosedReason::DailyBreak]);
        assert!(cal.explain(ms(2026, 1, 20, 12, 0)).is_empty());
    }

    #[test]
    fn next_open_is_inclusive_at_run_start() {
        let cal = ny();
        let resume = ms(2026, 1, 20, 22, 5);
        assert_eq!(cal.next_open(resume), resume);
        // strictly inside a run: the following run
        assert_eq!(cal.next_open(resume + 1), ms(2026, 1, 21, 22, 5));
    }

    #[test]
    fn sunday_run_crosses_local_midnight() {
        let cal = ny();
        // Sun 2026-01-25 23:30 NY = Mon 04:30Z; the run started Sunday 17:00 NY.
        let ts = ms(2026, 1, 26, 4, 30);
        assert!(cal.is_open(ts));
        assert_eq!(cal.next_pause(ts), ms(2026, 1, 26, 22, 0));
    }

    #[test]
    fn break_spilling_past_midnight_closes_next_morning() {
        let cal = TradingCalendar::new(
            &[],
            "spill",
            CalendarSettings {
                tz_name: "UTC".into(),
                weekly_open: "22:00".into(),
                weekly_close: "21:00".into(),
                daily_break_start: "23:50".into(),
                daily_break_minutes: 20,
            },
            None,
        );
        assert!(!cal.is_open(ms(2026, 1, 21, 0, 5)));
        assert_eq!(cal.explain(ms(2026, 1, 21, 0, 5)), vec![ClosedReason::DailyBreak]);
        assert!(cal.is_open(ms(2026, 1, 21, 0, 10)));
        assert_eq!(cal.next_open(ms(2026, 1, 20, 23, 55)), ms(2026, 1, 21, 0, 10));
    }

    #[test]
    fn closed_interval_cuts_runs() {
        let ci = (ms(2026, 1, 5, 10, 0), ms(2026, 1, 5, 11, 0));
        let cal = TradingCalendar::new(&[ci], "ci", CalendarSettings::default(), None);
        assert_eq!(cal.next_pause(ms(2026, 1, 5, 9, 0)), ci.0);
        assert_eq!(cal.next_open(ms(2026, 1, 5, 10, 30)), ci.1);
        assert_eq!(cal.next_pause(ms(2026, 1, 5, 10, 30)), ms(2026, 1, 5, 22, 0));
        assert_eq!(
            cal.explain(ms(2026, 1, 5, 10, 30)),
            vec![ClosedReason::ClosedInterval]
        );
    }

    #[test]
    fn long_closure_is_skipped() {
        // three weeks closed
        let ci = (ms(2026, 2, 2, 0, 0), ms(2026, 2, 23, 0, 0));
        let cal = TradingCalendar::new(&[ci], "long", CalendarSettings::default(), None);
        assert_eq!(cal.next_open(ms(2026, 2, 10, 0, 0)), ci.1);
        assert!(cal.is_open(ci.1));
    }

    #[test]
    fn broken_calendar_degrades() {
        let cal = TradingCalendar::new(
            &[],
            "bad",
            CalendarSettings {
                tz_name: "Mars/Olympus".into(),
                daily_break_minutes: 0,
                ..CalendarSettings::default()
            },
            None,
        );
        let ts = ms(2026, 1, 20, 12, 0);
        let err = cal.health_error().unwrap();
        assert!(err.contains("Mars/Olympus"));
        assert!(err.contains("daily_break_minutes"));
        assert_eq!(cal.tz_backend(), TzBackend::Unknown);
        assert!(!cal.is_open(ts));
        assert_eq!(cal.next_open(ts), ts);
        assert_eq!(cal.next_pause(ts), ts);
        assert_eq!(cal.explain(ts), vec![ClosedReason::CalendarError]);
        assert_eq!(cal.trading_day_boundary_for(ts), ts);
    }

    #[test]
    fn overlapping_intervals_break_the_calendar() {
        let base = ms(2026, 1, 5, 0, 0);
        let cal = TradingCalendar::new(
            &[(base, base + 100), (base + 50, base + 150)],
            "overlap",
            CalendarSettings::default(),
            None,
        );
        assert!(cal.health_error().unwrap().contains("overlap"));
    }

    #[test]
    fn trading_day_boundaries() {
        let cal = ny();
        let ts = ms(2026, 1, 18, 21, 30);
        assert_eq!(cal.trading_day_boundary_for(ts), ms(2026, 1, 17, 22, 0));
        assert_eq!(cal.next_trading_day_boundary_ms(ts), ms(2026, 1, 18, 22, 0));
        let at = ms(2026, 1, 18, 22, 0);
        assert_eq!(cal.trading_day_boundary_for(at), at);
        assert_eq!(cal.next_trading_day_boundary_ms(at), ms(2026, 1, 19, 22, 0));
    }

    #[test]
    fn last_close_and_repair_window() {
        let cal = ny();
        let open = ms(2026, 1, 20, 15, 0);
        assert_eq!(cal.last_trading_close_ms(open), ms(2026, 1, 20, 22, 0) - 1);
        let saturday = ms(2026, 1, 24, 12, 0);
        assert_eq!(cal.last_trading_close_ms(saturday), ms(2026, 1, 23, 22, 0) - 1);
        assert!(cal.is_repair_window(saturday, true));
        assert!(!cal.is_repair_window(open, true));
        assert!(cal.is_repair_window(open, false));
    }

    #[test]
    fn utc_profile_schedule() {
        let cal = utc_profile();
        assert_eq!(cal.tz_backend(), TzBackend::Utc);
        assert!(cal.is_open(ms(2026, 1, 7, 21, 59)));
        assert!(!cal.is_open(ms(2026, 1, 7, 22, 1)));
        assert!(!cal.is_open(ms(2026, 1, 9, 21, 46)));
        assert!(cal.is_open(ms(2026, 1, 11, 23, 2)));
    }

    proptest! {
        #[test]
        fn pause_and_open_are_transitions(offset in 0i64..(365 * MS_PER_DAY)) {
            let ts = ms(2026, 1, 1, 0, 0) + offset;
            for cal in [ny(), utc_profile()] {
                let open = cal.next_open(ts);
                prop_assert!(open >= ts);
                prop_assert!(cal.is_open(open));
                let pause = cal.next_pause(ts);
                prop_assert!(pause > ts);
                prop_assert!(!cal.is_open(pause));
                if cal.is_open(ts) {
                    prop_assert!(cal.is_open(pause - 1));
                } else {
                    prop_assert!(pause > open);
                }
            }
        }
    }
}
