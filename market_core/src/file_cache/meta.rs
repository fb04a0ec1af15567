//! Sidecar metadata (`{SYMBOL}_{tf}.meta.json`), version 1.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::{CoreError, CoreResult},
    timeframe::Timeframe,
};

/// The only supported metadata version.
pub const CACHE_VERSION: u32 = 1;

/// Metadata written next to every cache file. Unknown keys are ignored on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheMeta {
    /// Always [`CACHE_VERSION`].
    pub version: u32,
    /// Number of rows in the tabular file.
    pub rows: u64,
    /// `close_time_ms` of the newest row, 0 when empty.
    pub last_close_time_ms: i64,
    /// Time of the last save, `YYYY-MM-DDTHH:MM:SSZ`; empty before the first save.
    pub last_refresh_utc: String,
    /// Caller-supplied stream heartbeat (epoch ms), 0 when never set.
    pub last_stream_heartbeat: i64,
    /// Publication watermark, written only through `mark_published`.
    pub last_published_open_time_ms: i64,
    /// Cache binding, for operators.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// Cache binding, for operators.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tf: Option<Timeframe>,
}

impl Default for CacheMeta {
    fn default() -> Self {
        Self {
            version: CACHE_VERSION,
            rows: 0,
            last_close_time_ms: 0,
            last_refresh_utc: String::new(),
            last_stream_heartbeat: 0,
            last_published_open_time_ms: 0,
            symbol: None,
            tf: None,
        }
    }
}

impl CacheMeta {
    /// Parse metadata text. Non-objects, missing or foreign versions and
    /// mistyped fields are contract violations.
    pub fn parse(text: &str) -> CoreResult<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| CoreError::contract(format!("meta is not valid JSON: {e}")))?;
        let obj = value
            .as_object()
            .ok_or_else(|| CoreError::contract("meta must be a JSON object"))?;
        match obj.get("version").and_then(Value::as_u64) {
            Some(v) if v == u64::from(CACHE_VERSION) => {}
            other => {
                return Err(CoreError::contract(format!(
                    "unsupported meta version {other:?}, expected {CACHE_VERSION}"
                )));
            }
        }
        serde_json::from_value(value).map_err(|e| CoreError::contract(format!("meta field: {e}")))
    }

    /// Two-space indented JSON with a trailing newline.
    pub fn to_pretty_json(&self) -> CoreResult<String> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }
}
