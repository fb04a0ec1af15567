//! Runtime configuration for the core (TOML file + environment overrides).
//!
//! ```toml
//! cache_root = "cache"
//! cache_max_bars = 60000
//! cache_warmup_bars = 1600
//! archive_db_path = "data/live_archive.sqlite"
//! calendar_tag = "fx_calendar_v1_utc"
//! calendar_overrides_path = "config/calendar_overrides.json"
//! ```
//!
//! Every key is optional; unknown keys are rejected. Environment variables win over
//! the file: `MARKET_CORE_CACHE_ROOT`, `MARKET_CORE_CACHE_MAX_BARS`,
//! `MARKET_CORE_ARCHIVE_DB`, `MARKET_CORE_CALENDAR_TAG`. `MARKET_CORE_CONFIG`
//! names the file itself.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use shared_utils::env::{get_env_opt, parse_env_opt};

use crate::{
    calendar::TradingCalendar,
    error::{CoreError, CoreResult},
    file_cache::FileCache,
    live_archive::SqliteLiveArchive,
    timeframe::Timeframe,
};

/// Env var naming the TOML file read by [`CoreConfig::from_env`].
pub const ENV_CONFIG_PATH: &str = "MARKET_CORE_CONFIG";
/// Env override for `cache_root`.
pub const ENV_CACHE_ROOT: &str = "MARKET_CORE_CACHE_ROOT";
/// Env override for `cache_max_bars`.
pub const ENV_CACHE_MAX_BARS: &str = "MARKET_CORE_CACHE_MAX_BARS";
/// Env override for `archive_db_path`.
pub const ENV_ARCHIVE_DB: &str = "MARKET_CORE_ARCHIVE_DB";
/// Env override for `calendar_tag`.
pub const ENV_CALENDAR_TAG: &str = "MARKET_CORE_CALENDAR_TAG";

/// Paths and bounds shared by the calendar, the cache and the archive.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// Directory holding `{SYMBOL}_{tf}.csv` / `.meta.json` pairs.
    pub cache_root: PathBuf,
    /// Ring-buffer bound per cache.
    pub cache_max_bars: usize,
    /// Fast-start bound; 0 disables it.
    pub cache_warmup_bars: usize,
    /// SQLite file of the live archive.
    pub archive_db_path: PathBuf,
    /// Profile selected from the overrides file.
    pub calendar_tag: String,
    /// Calendar overrides file.
    pub calendar_overrides_path: PathBuf,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            cache_root: PathBuf::from("cache"),
            cache_max_bars: 60_000,
            cache_warmup_bars: 1_600,
            archive_db_path: PathBuf::from("data/live_archive.sqlite"),
            calendar_tag: "fx_calendar_v1_utc".to_string(),
            calendar_overrides_path: PathBuf::from("config/calendar_overrides.json"),
        }
    }
}

impl CoreConfig {
    /// Parse and validate TOML text.
    pub fn load_str(s: &str) -> CoreResult<Self> {
        let cfg: CoreConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a TOML file.
    pub fn load_path(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .map_err(|e| CoreError::input(format!("cannot read config {}: {e}", path.display())))?;
        Self::load_str(&s)
    }

    /// File named by `MARKET_CORE_CONFIG` (defaults otherwise), then env overrides.
    pub fn from_env() -> CoreResult<Self> {
        let mut cfg = match get_env_opt(ENV_CONFIG_PATH) {
            Some(path) => Self::load_path(path)?,
            None => Self::default(),
        };
        cfg.apply_overrides(get_env_opt);
        if let Some(max_bars) = parse_env_opt::<usize>(ENV_CACHE_MAX_BARS)? {
            cfg.cache_max_bars = max_bars;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply overrides from `lookup` (an env reader in production).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup(ENV_CACHE_ROOT) {
            self.cache_root = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_ARCHIVE_DB) {
            self.archive_db_path = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_CALENDAR_TAG) {
            self.calendar_tag = v;
        }
    }

    /// Bounds and required values.
    pub fn validate(&self) -> CoreResult<()> {
        if self.cache_max_bars == 0 {
            return Err(CoreError::input("cache_max_bars must be > 0"));
        }
        if self.calendar_tag.trim().is_empty() {
            return Err(CoreError::input("calendar_tag must be non-empty"));
        }
        Ok(())
    }

    /// Calendar for the configured profile.
    pub fn build_calendar(&self) -> CoreResult<TradingCalendar> {
        TradingCalendar::from_overrides_file(&self.calendar_overrides_path, &self.calendar_tag)
    }

    /// Cache bound to `(symbol, tf)` under `cache_root`.
    pub fn file_cache(&self, symbol: &str, tf: Timeframe) -> CoreResult<FileCache> {
        FileCache::new(
            self.cache_root.clone(),
            symbol,
            tf,
            self.cache_max_bars,
            self.cache_warmup_bars,
        )
    }

    /// Open the configured archive.
    pub fn open_archive(&self) -> CoreResult<SqliteLiveArchive> {
        SqliteLiveArchive::open(&self.archive_db_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(CoreConfig::load_str("").unwrap(), CoreConfig::default());
    }

    #[test]
    fn unknown_keys_and_bad_bounds_are_rejected() {
        assert!(matches!(CoreConfig::load_str("cache_rot = \"x\""), Err(CoreError::Toml(_))));
        assert!(matches!(
            CoreConfig::load_str("cache_max_bars = 0"),
            Err(CoreError::Input(_))
        ));
        assert!(CoreConfig::load_str("calendar_tag = \" \"").is_err());
        assert!(CoreConfig::load_str("cache_warmup_bars = -1").is_err());
    }

    #[test]
    fn overrides_win_over_file() {
        let mut cfg = CoreConfig::load_str("cache_root = \"/srv/cache\"\ncache_max_bars = 10").unwrap();
        let env: HashMap<&str, &str> =
            [(ENV_CACHE_ROOT, "/tmp/c"), (ENV_CALENDAR_TAG, "fx_calendar_v1_ny")].into();
        cfg.apply_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.cache_root, PathBuf::from("/tmp/c"));
        assert_eq!(cfg.calendar_tag, "fx_calendar_v1_ny");
        assert_eq!(cfg.cache_max_bars, 10);
        assert_eq!(cfg.archive_db_path, PathBuf::from("data/live_archive.sqlite"));
    }

    // the only test touching the process environment
    #[test]
    fn max_bars_env_override_is_parsed() {
        unsafe { std::env::set_var(ENV_CACHE_MAX_BARS, "250") };
        let parsed = CoreConfig::from_env();
        unsafe { std::env::set_var(ENV_CACHE_MAX_BARS, "lots") };
        let garbage = CoreConfig::from_env();
        unsafe { std::env::remove_var(ENV_CACHE_MAX_BARS) };

        assert_eq!(parsed.unwrap().cache_max_bars, 250);
        let err = garbage.unwrap_err();
        assert!(matches!(err, CoreError::Input(_)));
        assert!(err.to_string().contains(ENV_CACHE_MAX_BARS), "{err}");
    }
}
