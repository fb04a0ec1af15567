//! Canonical bar timeframes.
//!
//! The table is exhaustive: `1m`, `5m`, `15m`, `1h`, `4h`, `1d`. Parsing accepts the
//! legacy aliases `m1`/`1min`, `h1` and `d1` (case-insensitive, surrounding whitespace
//! ignored); `Display` and serde always produce the canonical form.
//!
//! ```
//! use market_core::timeframe::Timeframe;
//!
//! let tf: Timeframe = "M1".parse().unwrap();
//! assert_eq!(tf, Timeframe::M1);
//! assert_eq!(tf.ms(), 60_000);
//! assert_eq!(tf.to_string(), "1m");
//! ```

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// A canonical bar duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Timeframe {
    /// One minute.
    M1,
    /// Five minutes.
    M5,
    /// Fifteen minutes.
    M15,
    /// One hour.
    H1,
    /// Four hours.
    H4,
    /// One day.
    D1,
}

impl Timeframe {
    /// Every canonical timeframe, shortest first.
    pub const ALL: [Timeframe; 6] = [
        Timeframe::M1,
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::H1,
        Timeframe::H4,
        Timeframe::D1,
    ];

    /// Bar width in milliseconds.
    pub const fn ms(self) -> i64 {
        match self {
            Timeframe::M1 => 60_000,
            Timeframe::M5 => 300_000,
            Timeframe::M15 => 900_000,
            Timeframe::H1 => 3_600_000,
            Timeframe::H4 => 14_400_000,
            Timeframe::D1 => 86_400_000,
        }
    }

    /// Canonical string (`"1m"`, `"1h"`, ...).
    pub const fn as_str(self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
        }
    }

    /// Strict lookup: only the canonical spelling is accepted.
    pub fn from_canonical(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tf| tf.as_str() == s)
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        if key.is_empty() {
            return Err(CoreError::input("tf must be a non-empty string"));
        }
        let tf = match key.as_str() {
            "1m" | "m1" | "1min" => Timeframe::M1,
            "5m" => Timeframe::M5,
            "15m" => Timeframe::M15,
            "1h" | "h1" => Timeframe::H1,
            "4h" => Timeframe::H4,
            "1d" | "d1" => Timeframe::D1,
            _ => return Err(CoreError::input(format!("unsupported tf: {s}"))),
        };
        Ok(tf)
    }
}

impl Serialize for Timeframe {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Timeframe {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
