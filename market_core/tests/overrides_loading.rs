use market_core::calendar::overrides::{load_overrides_path, write_overrides_path};
use market_core::calendar::{CalendarOverrides, load_calendar_overrides, validate_holiday_policy};
use std::fs;

mod common;
use common::ms;

#[test]
fn shipped_tags_load() {
    let ny = load_calendar_overrides(common::overrides_path(), "fx_calendar_v1_ny").unwrap();
    assert_eq!(ny.tz_name, "America/New_York");
    assert_eq!(ny.daily_break_minutes, 5);

    let utc = load_calendar_overrides(common::overrides_path(), "fx_calendar_v1_utc").unwrap();
    assert_eq!(utc.tz_name, "UTC");
    assert_eq!(utc.daily_break_minutes, 61);

    assert!(load_calendar_overrides(common::overrides_path(), "fx_calendar_v0").is_err());
}

#[test]
fn shipped_policy_holds_at_a_fixed_clock() {
    let now = ms(2026, 6, 1, 0, 0, 0);
    for (tag, profile) in load_overrides_path(common::overrides_path()).unwrap() {
        validate_holiday_policy(&profile, now).unwrap_or_else(|e| panic!("{tag}: {e}"));
    }
    // coverage ends with 2027; far enough ahead it no longer holds
    let late = ms(2027, 12, 20, 0, 0, 0);
    let ny = load_calendar_overrides(common::overrides_path(), "fx_calendar_v1_ny").unwrap();
    assert!(validate_holiday_policy(&ny, late).is_err());
}

#[test]
fn canonical_rewrite_is_byte_identical() {
    let original = fs::read_to_string(common::overrides_path()).unwrap();
    let profiles: Vec<CalendarOverrides> =
        load_overrides_path(common::overrides_path()).unwrap().into_values().collect();

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("calendar_overrides.json");
    write_overrides_path(&out, &profiles).unwrap();
    assert_eq!(fs::read_to_string(&out).unwrap(), original);
}

#[test]
fn legacy_file_is_canonicalized_on_write() {
    let dir = tempfile::tempdir().unwrap();
    let legacy = dir.path().join("legacy.json");
    fs::write(
        &legacy,
        r#"[{"calendar_tag": "fx_legacy", "recurrence_tz": "Europe/London",
            "weekly_open_local": "22:00", "weekly_close_local": "22:00",
            "daily_break_local": {"start": "22:00", "end": "22:05"},
            "closed_intervals_utc": []}]"#,
    )
    .unwrap();
    let profile = load_calendar_overrides(&legacy, "fx_legacy").unwrap();
    assert_eq!(profile.daily_break_minutes, 5);

    let out = dir.path().join("canonical.json");
    write_overrides_path(&out, &[profile]).unwrap();
    let text = fs::read_to_string(&out).unwrap();
    assert!(text.contains("\"tz_name\": \"Europe/London\""));
    assert!(text.contains("\"daily_break_start\": \"22:00\""));
    assert!(!text.contains("recurrence_tz"));
    assert!(!text.contains("holiday_policy"));
}
