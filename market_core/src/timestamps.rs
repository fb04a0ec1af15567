//! Epoch-millisecond rails.
//!
//! Integer UTC milliseconds are the only accepted time type. A valid value has a
//! four-digit year, i.e. lies in `[1e12, 1e13)`. Seconds are rejected by magnitude,
//! microseconds likewise, and floats or booleans never pass as timestamps.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::error::{CoreError, CoreResult};

/// Smallest accepted epoch-ms value (2001-09-09).
pub const MIN_EPOCH_MS: i64 = 1_000_000_000_000;
/// Largest accepted epoch-ms value (2286-11-20).
pub const MAX_EPOCH_MS: i64 = 9_999_999_999_999;

/// Milliseconds in one day.
pub const MS_PER_DAY: i64 = 86_400_000;

/// `true` if `ts` lies on the epoch-ms rails.
pub const fn is_epoch_ms(ts: i64) -> bool {
    ts >= MIN_EPOCH_MS && ts <= MAX_EPOCH_MS
}

/// Check an integer against the epoch-ms rails.
pub fn require_epoch_ms(ts: i64, field: &str) -> CoreResult<i64> {
    if ts < MIN_EPOCH_MS {
        return Err(CoreError::contract(format!(
            "{field} must be epoch ms (>= 1e12), got {ts}"
        )));
    }
    if ts > MAX_EPOCH_MS {
        return Err(CoreError::contract(format!(
            "{field} must be epoch ms, not microseconds: {ts}"
        )));
    }
    Ok(ts)
}

/// Extract an epoch-ms integer from a JSON value.
///
/// Booleans, floats (even integral ones such as `1.7e12`), strings and nulls are rejected.
pub fn require_epoch_ms_value(value: &Value, field: &str) -> CoreResult<i64> {
    let ts = match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => n
            .as_i64()
            .ok_or_else(|| CoreError::contract(format!("{field} out of i64 range")))?,
        Value::Number(_) => {
            return Err(CoreError::contract(format!("{field} must be int ms, not float")));
        }
        Value::Bool(_) => return Err(CoreError::contract(format!("{field} must be int, not bool"))),
        _ => return Err(CoreError::contract(format!("{field} must be int ms"))),
    };
    require_epoch_ms(ts, field)
}

/// Convert epoch ms to a UTC datetime. `None` if chrono cannot represent it.
pub fn ms_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ts)
}

/// Convert a UTC datetime to epoch ms.
pub fn utc_to_ms(dt: DateTime<Utc>) -> i64 {
    dt.timestamp_millis()
}

/// Format epoch ms as `YYYY-MM-DDTHH:MM:SSZ` (sub-second part dropped).
///
/// Unrepresentable values render as the Unix epoch.
pub fn to_utc_iso(ts: i64) -> String {
    let dt = ms_to_utc(ts).unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Host clock in epoch ms.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn rails_reject_seconds_and_micros() {
        assert!(require_epoch_ms(1_700_000_000, "ts").is_err());
        assert!(require_epoch_ms(1_700_000_000_000_000, "ts").is_err());
        assert_eq!(require_epoch_ms(1_700_000_000_000, "ts").unwrap(), 1_700_000_000_000);
    }

    #[test]
    fn json_rails_reject_float_and_bool() {
        assert!(require_epoch_ms_value(&json!(1.7e12), "ts").is_err());
        assert!(require_epoch_ms_value(&json!(1_700_000_000_000.0), "ts").is_err());
        assert!(require_epoch_ms_value(&json!(true), "ts").is_err());
        assert!(require_epoch_ms_value(&json!("1700000000000"), "ts").is_err());
        let err = require_epoch_ms_value(&json!(1.5), "ts").unwrap_err();
        assert!(err.is_contract());
        assert_eq!(
            require_epoch_ms_value(&json!(1_700_000_000_000i64), "ts").unwrap(),
            1_700_000_000_000
        );
    }

    #[test]
    fn iso_formatting_drops_millis() {
        let ts = Utc
            .with_ymd_and_hms(2026, 1, 20, 22, 0, 0)
            .unwrap()
            .timestamp_millis()
            + 123;
        assert_eq!(to_utc_iso(ts), "2026-01-20T22:00:00Z");
    }
}
