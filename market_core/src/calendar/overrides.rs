//! Calendar overrides: parsing, normalization, policy checks and canonical writing.
//!
//! The overrides file is a JSON array of named profiles. Each profile fully
//! describes one trading calendar (zone, weekly open/close, daily break, closed
//! intervals) plus a holiday policy stating how far ahead the closed intervals
//! must be maintained.
//!
//! Key behaviors:
//! - Legacy keys are accepted on read: `recurrence_tz`, `weekly_open_local`,
//!   `weekly_close_local` and `daily_break_local: {start, end}`. Writing always
//!   emits the canonical keys.
//! - Closed intervals are normalized (sorted, overlap-free) at load time.
//! - Any malformed profile fails the whole load with [`CoreError::Input`]; the
//!   calendar itself never sees a bad file.
//!
//! Entrypoints:
//! - [`load_overrides_str`] / [`load_overrides_path`]: every profile, keyed by tag.
//! - [`load_calendar_overrides`]: one profile by tag.
//! - [`validate_holiday_policy`]: coverage checks against a clock.
//! - [`write_overrides_path`]: canonical, atomically replaced output.

use std::path::Path;

use chrono::{NaiveTime, Timelike};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    atomic::atomic_write_bytes,
    calendar::intervals::{closed_intervals_from_json, normalize_closed_intervals},
    error::{CoreError, CoreResult},
    timestamps::MS_PER_DAY,
};

/// How far ahead closed intervals (holidays) must be maintained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HolidayPolicy {
    /// Whether `min_future_days` coverage is enforced.
    pub required: bool,
    /// Must equal the maximum `end_ms` of the profile's closed intervals.
    pub coverage_end_utc: i64,
    /// Minimum number of closed intervals (> 0).
    pub min_intervals: u32,
    /// Required look-ahead in days from "now" when `required` is set.
    pub min_future_days: u32,
}

/// One canonical calendar profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarOverrides {
    /// Profile identifier.
    pub calendar_tag: String,
    /// IANA zone name or `UTC`.
    pub tz_name: String,
    /// Sunday open, local `HH:MM`.
    pub weekly_open: String,
    /// Friday close, local `HH:MM`.
    pub weekly_close: String,
    /// Mon–Thu daily break start, local `HH:MM`.
    pub daily_break_start: String,
    /// Daily break length in minutes (> 0).
    pub daily_break_minutes: i64,
    /// Normalized closed intervals, `[start_ms, end_ms)` pairs.
    pub closed_intervals_utc: Vec<(i64, i64)>,
    /// Holiday coverage policy, if declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holiday_policy: Option<HolidayPolicy>,
}

#[derive(Debug, Deserialize)]
struct LegacyBreak {
    start: String,
    end: String,
}

#[derive(Debug, Deserialize)]
struct RawProfile {
    calendar_tag: String,
    #[serde(alias = "recurrence_tz")]
    tz_name: String,
    #[serde(alias = "weekly_open_local")]
    weekly_open: String,
    #[serde(alias = "weekly_close_local")]
    weekly_close: String,
    daily_break_start: Option<String>,
    daily_break_minutes: Option<i64>,
    daily_break_local: Option<LegacyBreak>,
    #[serde(default)]
    closed_intervals_utc: Option<Value>,
    holiday_policy: Option<HolidayPolicy>,
}

/// Parse a strict `HH:MM` wall time.
pub fn parse_hhmm(value: &str) -> CoreResult<NaiveTime> {
    let bad = || CoreError::input(format!("time must be HH:MM, got {value:?}"));
    let (h, m) = value.split_once(':').ok_or_else(bad)?;
    let digits = |s: &str| !s.is_empty() && s.len() <= 2 && s.bytes().all(|b| b.is_ascii_digit());
    if !digits(h) || !digits(m) {
        return Err(bad());
    }
    let hour: u32 = h.parse().map_err(|_| bad())?;
    let minute: u32 = m.parse().map_err(|_| bad())?;
    NaiveTime::from_hms_opt(hour, minute, 0)
        .filter(|_| hour <= 23 && minute <= 59)
        .ok_or_else(|| CoreError::input(format!("time out of range: {value:?}")))
}

fn minutes_of_day(t: NaiveTime) -> i64 {
    i64::from(t.hour()) * 60 + i64::from(t.minute())
}

impl TryFrom<RawProfile> for CalendarOverrides {
    type Error = CoreError;

    fn try_from(raw: RawProfile) -> CoreResult<Self> {
        let tag = raw.calendar_tag.trim().to_string();
        if tag.is_empty() {
            return Err(CoreError::input("calendar_tag must be non-empty"));
        }
        if raw.tz_name.trim().is_empty() {
            return Err(CoreError::input(format!("tz_name must be non-empty for {tag}")));
        }
        parse_hhmm(&raw.weekly_open)?;
        parse_hhmm(&raw.weekly_close)?;

        let (break_start, break_minutes) = match (raw.daily_break_start, raw.daily_break_minutes, raw.daily_break_local) {
            (Some(start), Some(minutes), _) => (start, minutes),
            (None, None, Some(legacy)) => {
                let s = parse_hhmm(&legacy.start)?;
                let e = parse_hhmm(&legacy.end)?;
                let minutes = (minutes_of_day(e) - minutes_of_day(s)).rem_euclid(24 * 60);
                (legacy.start, minutes)
            }
            _ => {
                return Err(CoreError::input(format!(
                    "{tag}: need daily_break_start + daily_break_minutes (or legacy daily_break_local)"
                )));
            }
        };
        parse_hhmm(&break_start)?;
        if break_minutes <= 0 {
            return Err(CoreError::input(format!("{tag}: daily_break_minutes must be > 0")));
        }

        let raw_intervals = match &raw.closed_intervals_utc {
            None | Some(Value::Null) => Vec::new(),
            Some(v) => closed_intervals_from_json(v)?,
        };
        let closed = normalize_closed_intervals(raw_intervals)?
            .into_iter()
            .map(Into::into)
            .collect();

        if let Some(policy) = &raw.holiday_policy {
            if policy.min_intervals == 0 {
                return Err(CoreError::input(format!(
                    "{tag}: holiday_policy.min_intervals must be > 0"
                )));
            }
        }

        Ok(CalendarOverrides {
            calendar_tag: tag,
            tz_name: raw.tz_name.trim().to_string(),
            weekly_open: raw.weekly_open,
            weekly_close: raw.weekly_close,
            daily_break_start: break_start,
            daily_break_minutes: break_minutes,
            closed_intervals_utc: closed,
            holiday_policy: raw.holiday_policy,
        })
    }
}

/// Parse every profile from a JSON string, keyed by tag (file order kept).
pub fn load_overrides_str(s: &str) -> CoreResult<IndexMap<String, CalendarOverrides>> {
    let data: Value = serde_json::from_str(s)
        .map_err(|e| CoreError::input(format!("calendar overrides are not valid JSON: {e}")))?;
    let items = data
        .as_array()
        .ok_or_else(|| CoreError::input("calendar overrides must be a list of profiles"))?;

    let mut out = IndexMap::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let raw: RawProfile = serde_json::from_value(item.clone())
            .map_err(|e| CoreError::input(format!("profile[{idx}]: {e}")))?;
        let profile = CalendarOverrides::try_from(raw)?;
        if out.contains_key(&profile.calendar_tag) {
            return Err(CoreError::input(format!(
                "duplicate calendar_tag: {}",
                profile.calendar_tag
            )));
        }
        out.insert(profile.calendar_tag.clone(), profile);
    }
    Ok(out)
}

/// Read and parse every profile from a file.
pub fn load_overrides_path(path: impl AsRef<Path>) -> CoreResult<IndexMap<String, CalendarOverrides>> {
    let path = path.as_ref();
    let s = std::fs::read_to_string(path)
        .map_err(|e| CoreError::input(format!("cannot read {}: {e}", path.display())))?;
    load_overrides_str(&s)
}

/// Load the single profile named `tag`. Unknown tags fail.
pub fn load_calendar_overrides(path: impl AsRef<Path>, tag: &str) -> CoreResult<CalendarOverrides> {
    let mut all = load_overrides_path(path)?;
    all.shift_remove(tag)
        .ok_or_else(|| CoreError::input(format!("unknown calendar_tag: {tag}")))
}

/// Check a profile's holiday policy against `now_ms`.
///
/// - the policy must be present
/// - there are at least `min_intervals` closed intervals
/// - `coverage_end_utc == max(end_ms)`
/// - when `required`, coverage reaches `now + min_future_days`
pub fn validate_holiday_policy(profile: &CalendarOverrides, now_ms: i64) -> CoreResult<()> {
    let tag = &profile.calendar_tag;
    let policy = profile
        .holiday_policy
        .ok_or_else(|| CoreError::input(format!("{tag}: holiday_policy is missing")))?;
    if policy.min_intervals == 0 {
        return Err(CoreError::input(format!("{tag}: holiday_policy.min_intervals must be > 0")));
    }
    let count = profile.closed_intervals_utc.len();
    if count < policy.min_intervals as usize {
        return Err(CoreError::input(format!(
            "{tag}: closed_intervals_utc below minimum ({count} < {})",
            policy.min_intervals
        )));
    }
    let max_end = profile
        .closed_intervals_utc
        .iter()
        .map(|(_, end)| *end)
        .max()
        .unwrap_or(0);
    if max_end != policy.coverage_end_utc {
        return Err(CoreError::input(format!(
            "{tag}: coverage_end_utc {} must equal max(end_ms) {max_end}",
            policy.coverage_end_utc
        )));
    }
    if policy.required {
        let required_end = now_ms + i64::from(policy.min_future_days) * MS_PER_DAY;
        if policy.coverage_end_utc < required_end {
            return Err(CoreError::input(format!(
                "{tag}: coverage_end_utc does not cover min_future_days={}",
                policy.min_future_days
            )));
        }
    }
    Ok(())
}

/// Write profiles with canonical keys, 2-space indentation and a trailing newline.
pub fn write_overrides_path(path: impl AsRef<Path>, profiles: &[CalendarOverrides]) -> CoreResult<()> {
    let mut body = serde_json::to_string_pretty(profiles)?;
    body.push('\n');
    atomic_write_bytes(path.as_ref(), body.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BASE: i64 = 1_800_000_000_000;

    fn profile_json() -> Value {
        json!({
            "calendar_tag": "ny",
            "tz_name": "America/New_York",
            "weekly_open": "17:00",
            "weekly_close": "17:00",
            "daily_break_start": "17:00",
            "daily_break_minutes": 5,
            "closed_intervals_utc": [[BASE + 100, BASE + 200], [BASE, BASE + 100]],
            "holiday_policy": {
                "required": true,
                "coverage_end_utc": BASE + 200,
                "min_intervals": 1,
                "min_future_days": 0
            }
        })
    }

    #[test]
    fn parses_and_normalizes() {
        let all = load_overrides_str(&json!([profile_json()]).to_string()).unwrap();
        let p = &all["ny"];
        assert_eq!(p.daily_break_minutes, 5);
        assert_eq!(p.closed_intervals_utc, vec![(BASE, BASE + 100), (BASE + 100, BASE + 200)]);
    }

    #[test]
    fn legacy_keys_are_accepted() {
        let legacy = json!([{
            "calendar_tag": "legacy",
            "recurrence_tz": "UTC",
            "weekly_open_local": "23:01",
            "weekly_close_local": "21:45",
            "daily_break_local": {"start": "22:00", "end": "23:01"},
        }]);
        let all = load_overrides_str(&legacy.to_string()).unwrap();
        let p = &all["legacy"];
        assert_eq!(p.tz_name, "UTC");
        assert_eq!(p.weekly_open, "23:01");
        assert_eq!(p.daily_break_start, "22:00");
        assert_eq!(p.daily_break_minutes, 61);
        assert!(p.closed_intervals_utc.is_empty());
    }

    #[test]
    fn legacy_break_wrapping_midnight() {
        let legacy = json!([{
            "calendar_tag": "wrap",
            "tz_name": "UTC",
            "weekly_open": "22:00",
            "weekly_close": "21:00",
            "daily_break_local": {"start": "23:50", "end": "00:10"},
        }]);
        let all = load_overrides_str(&legacy.to_string()).unwrap();
        assert_eq!(all["wrap"].daily_break_minutes, 20);
    }

    #[test]
    fn malformed_profiles_fail_the_loader() {
        for bad in [
            json!({"a": 1}),
            json!([{"calendar_tag": "x"}]),
            json!([{"calendar_tag": "x", "tz_name": "UTC", "weekly_open": "25:00",
                    "weekly_close": "17:00", "daily_break_start": "17:00", "daily_break_minutes": 5}]),
            json!([{"calendar_tag": "x", "tz_name": "UTC", "weekly_open": "17:00",
                    "weekly_close": "17:00", "daily_break_start": "17:00", "daily_break_minutes": 0}]),
            json!([{"calendar_tag": "x", "tz_name": "UTC", "weekly_open": "17:00",
                    "weekly_close": "17:00", "daily_break_start": "17:00", "daily_break_minutes": 5,
                    "closed_intervals_utc": [[BASE, BASE + 10], [BASE + 5, BASE + 20]]}]),
        ] {
            let err = load_overrides_str(&bad.to_string()).unwrap_err();
            assert!(matches!(err, CoreError::Input(_)), "{bad}: {err}");
        }
        assert!(load_overrides_str("not json").is_err());
        let dup = json!([profile_json(), profile_json()]);
        assert!(load_overrides_str(&dup.to_string()).unwrap_err().to_string().contains("duplicate"));
    }

    #[test]
    fn hhmm_parsing() {
        assert_eq!(parse_hhmm("09:05").unwrap(), NaiveTime::from_hms_opt(9, 5, 0).unwrap());
        assert_eq!(parse_hhmm("0:00").unwrap(), NaiveTime::MIN);
        for bad in ["24:00", "12:60", "1200", "12:5x", "", ":", "12:00:00", "-1:00"] {
            assert!(parse_hhmm(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn holiday_policy_rules() {
        let all = load_overrides_str(&json!([profile_json()]).to_string()).unwrap();
        let mut p = all["ny"].clone();
        assert!(validate_holiday_policy(&p, BASE).is_ok());

        p.holiday_policy.as_mut().unwrap().min_future_days = 1;
        assert!(validate_holiday_policy(&p, BASE).is_err());
        p.holiday_policy.as_mut().unwrap().required = false;
        assert!(validate_holiday_policy(&p, BASE).is_ok());

        p.holiday_policy.as_mut().unwrap().coverage_end_utc = BASE + 199;
        assert!(validate_holiday_policy(&p, BASE).is_err());

        let mut p = all["ny"].clone();
        p.holiday_policy.as_mut().unwrap().min_intervals = 3;
        assert!(validate_holiday_policy(&p, BASE).is_err());

        p.holiday_policy = None;
        assert!(validate_holiday_policy(&p, BASE).is_err());
    }

    #[test]
    fn canonical_write_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calendar_overrides.json");
        let all = load_overrides_str(&json!([profile_json()]).to_string()).unwrap();
        let profiles: Vec<CalendarOverrides> = all.values().cloned().collect();
        write_overrides_path(&path, &profiles).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("}\n]\n"));
        assert!(text.contains("\n  {\n    \"calendar_tag\": \"ny\""));
        let back = load_calendar_overrides(&path, "ny").unwrap();
        assert_eq!(back, profiles[0]);
        assert!(load_calendar_overrides(&path, "missing").is_err());
    }
}
