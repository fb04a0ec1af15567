//! Canonical complete bar (one cache row) and the normalizer that admits it.
//!
//! Incoming bars arrive as loosely typed JSON objects from upstream collaborators.
//! [`normalize_complete_bar`] is the only way such an object becomes a [`Bar`]:
//! it enforces epoch-ms integer times, geometry, `complete == true`, a
//! non-negative tick count and finite prices.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    bucket::validate_geometry,
    error::{CoreError, CoreResult},
    timeframe::Timeframe,
    timestamps::require_epoch_ms_value,
};

/// A single fully closed OHLCV bar.
///
/// Field order is the canonical column order of the tabular cache file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Normalized symbol (e.g. `"XAUUSD"`).
    pub symbol: String,
    /// Canonical timeframe.
    pub tf: Timeframe,
    /// Bucket open, aligned to `tf`.
    pub open_time_ms: i64,
    /// Inclusive bucket close, `open_time_ms + tf_ms - 1`.
    pub close_time_ms: i64,
    /// Opening price.
    pub open: f64,
    /// Highest price.
    pub high: f64,
    /// Lowest price.
    pub low: f64,
    /// Closing price.
    pub close: f64,
    /// Volume (0 when the source has none).
    pub volume: f64,
    /// Tick count (0 when the source has none).
    pub tick_count: u64,
}

/// Normalize a symbol: non-empty, upper-cased, `/` and spaces stripped.
///
/// `"xau/usd"` -> `"XAUUSD"`.
pub fn normalize_symbol(symbol: &str) -> CoreResult<String> {
    if symbol.trim().is_empty() {
        return Err(CoreError::input("symbol must be a non-empty string"));
    }
    let out: String = symbol
        .to_uppercase()
        .chars()
        .filter(|c| *c != '/' && *c != ' ')
        .collect();
    if out.is_empty() {
        return Err(CoreError::input(format!("symbol normalizes to empty: {symbol:?}")));
    }
    Ok(out)
}

fn first_present<'a>(bar: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| bar.get(*k))
}

fn require_finite(value: Option<&Value>, field: &str) -> CoreResult<f64> {
    let v = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match v {
        Some(x) if x.is_finite() => Ok(x),
        _ => Err(CoreError::contract(format!("{field} must be a finite number"))),
    }
}

fn require_tick_count(value: Option<&Value>) -> CoreResult<u64> {
    match value {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => {
            if let Some(v) = n.as_u64() {
                Ok(v)
            } else if n.as_i64().is_some() {
                Err(CoreError::contract("tick_count must be >= 0"))
            } else {
                Err(CoreError::contract("tick_count must be an integer"))
            }
        }
        Some(Value::Bool(_)) => Err(CoreError::contract("tick_count must be int, not bool")),
        Some(_) => Err(CoreError::contract("tick_count must be an integer")),
    }
}

/// Admit one incoming JSON bar into the cache for `(symbol, tf)`.
///
/// `symbol` must already be normalized. If the object carries its own `symbol` or
/// `tf`, they must agree with the cache binding after normalization.
pub fn normalize_complete_bar(symbol: &str, tf: Timeframe, bar: &Value) -> CoreResult<Bar> {
    let obj = bar
        .as_object()
        .ok_or_else(|| CoreError::contract("bar must be a JSON object"))?;

    if let Some(raw) = obj.get("symbol").and_then(Value::as_str) {
        let got = normalize_symbol(raw)?;
        if got != symbol {
            return Err(CoreError::contract(format!(
                "bar symbol {got} does not match cache symbol {symbol}"
            )));
        }
    }
    if let Some(raw) = obj.get("tf").and_then(Value::as_str) {
        let got: Timeframe = raw.parse()?;
        if got != tf {
            return Err(CoreError::contract(format!("bar tf {got} does not match cache tf {tf}")));
        }
    }

    let open_raw = first_present(obj, &["open_time_ms", "open_time"])
        .ok_or_else(|| CoreError::contract("open_time_ms is missing"))?;
    let close_raw = first_present(obj, &["close_time_ms", "close_time"])
        .ok_or_else(|| CoreError::contract("close_time_ms is missing"))?;
    let open_time_ms = require_epoch_ms_value(open_raw, "open_time_ms")?;
    let close_time_ms = require_epoch_ms_value(close_raw, "close_time_ms")?;
    validate_geometry(tf, open_time_ms, close_time_ms)?;

    if obj.get("complete") != Some(&Value::Bool(true)) {
        return Err(CoreError::contract("cache accepts only complete=true bars"));
    }

    let volume = match obj.get("volume") {
        None | Some(Value::Null) => 0.0,
        v => require_finite(v, "volume")?,
    };

    Ok(Bar {
        symbol: symbol.to_string(),
        tf,
        open_time_ms,
        close_time_ms,
        open: require_finite(obj.get("open"), "open")?,
        high: require_finite(obj.get("high"), "high")?,
        low: require_finite(obj.get("low"), "low")?,
        close: require_finite(obj.get("close"), "close")?,
        volume,
        tick_count: require_tick_count(obj.get("tick_count"))?,
    })
}

/// Price rails checked at the presentation boundary:
/// `high >= max(open, close)`, `low <= min(open, close)`, `high >= low`.
pub fn check_price_rails(bar: &Bar) -> CoreResult<()> {
    if bar.high < bar.open.max(bar.close) {
        return Err(CoreError::contract(format!(
            "high {} below max(open, close) at {}",
            bar.high, bar.open_time_ms
        )));
    }
    if bar.low > bar.open.min(bar.close) {
        return Err(CoreError::contract(format!(
            "low {} above min(open, close) at {}",
            bar.low, bar.open_time_ms
        )));
    }
    if bar.high < bar.low {
        return Err(CoreError::contract(format!("high < low at {}", bar.open_time_ms)));
    }
    Ok(())
}
