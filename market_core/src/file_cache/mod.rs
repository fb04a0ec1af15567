//! FileCache: the per-(symbol, tf) store of complete bars.
//!
//! Each instance is bound to one `(root, symbol, tf)` and owns two files:
//! - `{SYMBOL}_{tf}.csv`: one row per bar, header [`CACHE_COLUMNS`].
//! - `{SYMBOL}_{tf}.meta.json`: [`CacheMeta`].
//!
//! Work happens in explicit phases: [`FileCache::load`] → [`FileCache::append_bars`]
//! → [`FileCache::merge_and_trim`] → [`FileCache::save`]. Nothing touches disk
//! before `save`, and `save` renames the tabular file into place before rewriting
//! the metadata, so a reader never sees metadata describing a file that is not there.
//!
//! Concurrent writers to the same binding are not supported; callers serialize.

pub mod meta;
pub mod rows;

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::Serialize;
use serde_json::Value;

pub use meta::{CACHE_VERSION, CacheMeta};
pub use rows::{CACHE_COLUMNS, MergeOutcome, ensure_sorted_unique, merge_rows_keep_last, trim_rows};

use crate::{
    atomic::{atomic_write_bytes, atomic_write_with},
    bar::{Bar, normalize_complete_bar, normalize_symbol},
    bucket::validate_geometry,
    error::{CoreError, CoreResult},
    timeframe::Timeframe,
    timestamps::{now_ms, require_epoch_ms, to_utc_iso},
};

/// Counters reported by [`FileCache::merge_and_trim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MergeReport {
    /// Net growth of the row count once trimmed (never negative).
    pub inserted: usize,
    /// Pending rows that replaced an existing row or an earlier pending row.
    pub duplicates: usize,
    /// Rows held after the merge.
    pub total: usize,
    /// Oldest rows dropped to respect `max_bars`.
    pub trimmed: usize,
}

/// Operator view of one cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheSummary {
    /// Normalized symbol.
    pub symbol: String,
    /// Timeframe of the binding.
    pub tf: Timeframe,
    /// Rows held in memory.
    pub rows: usize,
    /// From metadata; 0 before the first save.
    pub last_close_time_ms: i64,
}

/// Bounded, deduplicated store of complete bars for one `(symbol, tf)`.
#[derive(Debug)]
pub struct FileCache {
    root: PathBuf,
    symbol: String,
    tf: Timeframe,
    max_bars: usize,
    warmup_bars: usize,
    rows: Vec<Bar>,
    pending: Vec<Bar>,
    meta: CacheMeta,
    heartbeat: Option<i64>,
    loaded: bool,
}

impl FileCache {
    /// Bind a cache. `max_bars` must be positive; `warmup_bars == 0` disables the
    /// warmup bound. Nothing is read until [`Self::load`].
    pub fn new(
        root: impl Into<PathBuf>,
        symbol: &str,
        tf: Timeframe,
        max_bars: usize,
        warmup_bars: usize,
    ) -> CoreResult<Self> {
        if max_bars == 0 {
            return Err(CoreError::input("max_bars must be > 0"));
        }
        Ok(Self {
            root: root.into(),
            symbol: normalize_symbol(symbol)?,
            tf,
            max_bars,
            warmup_bars,
            rows: Vec::new(),
            pending: Vec::new(),
            meta: CacheMeta::default(),
            heartbeat: None,
            loaded: false,
        })
    }

    /// Normalized symbol of the binding.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Timeframe of the binding.
    pub fn tf(&self) -> Timeframe {
        self.tf
    }

    /// Rows currently held in memory.
    pub fn rows(&self) -> &[Bar] {
        &self.rows
    }

    /// Metadata as last loaded or saved.
    pub fn meta(&self) -> &CacheMeta {
        &self.meta
    }

    /// Bars normalized by [`Self::append_bars`] and not yet merged.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Path of the tabular file.
    pub fn csv_path(&self) -> PathBuf {
        self.root.join(format!("{}_{}.csv", self.symbol, self.tf))
    }

    /// Path of the metadata file.
    pub fn meta_path(&self) -> PathBuf {
        self.root.join(format!("{}_{}.meta.json", self.symbol, self.tf))
    }

    /// Read both files into memory. Missing files yield empty rows and default
    /// metadata. Pending bars are discarded; a heartbeat set but not yet saved is
    /// kept. On error the in-memory state is left as it was.
    pub fn load(&mut self) -> CoreResult<&[Bar]> {
        let mut meta = self.read_meta()?;
        let rows = self.read_rows()?;
        if let Some(hb) = self.heartbeat {
            meta.last_stream_heartbeat = hb;
        }
        self.meta = meta;
        self.rows = rows;
        self.pending.clear();
        self.loaded = true;
        tracing::debug!(
            symbol = %self.symbol,
            tf = %self.tf,
            rows = self.rows.len(),
            "file cache loaded"
        );
        Ok(&self.rows)
    }

    /// Fast-start read: the newest `warmup_bars` rows (all rows when the bound is 0).
    /// Leaves the in-memory state untouched.
    pub fn load_warmup(&self) -> CoreResult<Vec<Bar>> {
        let mut rows = self.read_rows()?;
        if self.warmup_bars > 0 && rows.len() > self.warmup_bars {
            rows.drain(..rows.len() - self.warmup_bars);
        }
        Ok(rows)
    }

    /// Normalize incoming JSON bars into the pending buffer. All-or-nothing: one
    /// bad bar rejects the batch.
    pub fn append_bars(&mut self, incoming: &[Value]) -> CoreResult<usize> {
        let normalized = incoming
            .iter()
            .map(|raw| normalize_complete_bar(&self.symbol, self.tf, raw))
            .collect::<CoreResult<Vec<Bar>>>()?;
        let n = normalized.len();
        self.pending.extend(normalized);
        Ok(n)
    }

    /// Fold pending bars into the rows (last writer wins per `open_time_ms`) and
    /// keep the newest `max_bars` (or `max`, if given and positive).
    pub fn merge_and_trim(&mut self, max: Option<usize>) -> CoreResult<MergeReport> {
        let limit = max.filter(|m| *m > 0).unwrap_or(self.max_bars);
        let rows_before = self.rows.len();
        let incoming = std::mem::take(&mut self.pending);
        let existing = std::mem::take(&mut self.rows);
        let (mut merged, outcome) = merge_rows_keep_last(existing, incoming);
        let trimmed = trim_rows(&mut merged, limit);
        ensure_sorted_unique(&merged)?;
        self.rows = merged;

        let report = MergeReport {
            inserted: self.rows.len().saturating_sub(rows_before),
            duplicates: outcome.duplicates,
            total: self.rows.len(),
            trimmed,
        };
        tracing::debug!(symbol = %self.symbol, tf = %self.tf, ?report, "file cache merged");
        Ok(report)
    }

    /// Persist rows then metadata. `now_ms` defaults to the host clock.
    ///
    /// Refuses to run before [`Self::load`], which would replace the file with
    /// whatever happens to be in memory.
    pub fn save(&mut self, now_ms_override: Option<i64>) -> CoreResult<()> {
        if !self.loaded {
            return Err(CoreError::input("FileCache::save called before load"));
        }
        let now = now_ms_override.unwrap_or_else(now_ms);
        self.meta.version = meta::CACHE_VERSION;
        self.meta.rows = self.rows.len() as u64;
        self.meta.last_close_time_ms = self.rows.last().map_or(0, |b| b.close_time_ms);
        self.meta.last_refresh_utc = to_utc_iso(now);
        if let Some(hb) = self.heartbeat.take() {
            self.meta.last_stream_heartbeat = hb;
        }
        self.meta.symbol = Some(self.symbol.clone());
        self.meta.tf = Some(self.tf);

        write_csv(&self.csv_path(), &self.rows)?;
        atomic_write_bytes(&self.meta_path(), self.meta.to_pretty_json()?.as_bytes())?;

        tracing::info!(
            symbol = %self.symbol,
            tf = %self.tf,
            rows = self.rows.len(),
            last_close_time_ms = self.meta.last_close_time_ms,
            "file cache saved"
        );
        Ok(())
    }

    /// `load → append_bars → merge_and_trim → save` in one call. The stream
    /// heartbeat becomes `now_ms` unless the caller already set one.
    pub fn append_stream_bars(&mut self, bars: &[Value], now_ms_override: Option<i64>) -> CoreResult<MergeReport> {
        let now = now_ms_override.unwrap_or_else(now_ms);
        self.load()?;
        self.append_bars(bars)?;
        let report = self.merge_and_trim(None)?;
        if self.heartbeat.is_none() {
            self.heartbeat = Some(now);
        }
        self.save(Some(now))?;
        Ok(report)
    }

    /// The newest `limit` rows with `since <= open_time_ms <= until`.
    pub fn query(&self, limit: usize, since_open_ms: Option<i64>, until_open_ms: Option<i64>) -> Vec<Bar> {
        if limit == 0 {
            return Vec::new();
        }
        let matching: Vec<&Bar> = self
            .rows
            .iter()
            .filter(|b| since_open_ms.is_none_or(|s| b.open_time_ms >= s))
            .filter(|b| until_open_ms.is_none_or(|u| b.open_time_ms <= u))
            .collect();
        let skip = matching.len().saturating_sub(limit);
        matching.into_iter().skip(skip).cloned().collect()
    }

    /// Rows a subscriber has not seen yet: those newer than the publication
    /// watermark, or simply the tail when `force` is set or nothing was published.
    /// Bounded by `limit`, else `warmup_bars`, else `max_bars`.
    pub fn warmup_slice(&self, force: bool, limit: Option<usize>) -> Vec<Bar> {
        let bound = limit
            .filter(|l| *l > 0)
            .or((self.warmup_bars > 0).then_some(self.warmup_bars))
            .unwrap_or(self.max_bars);
        let watermark = self.meta.last_published_open_time_ms;
        let start = if force || watermark <= 0 {
            0
        } else {
            self.rows.partition_point(|b| b.open_time_ms <= watermark)
        };
        let slice = &self.rows[start..];
        slice[slice.len().saturating_sub(bound)..].to_vec()
    }

    /// Record that bars up to `open_time_ms` were published, and persist.
    pub fn mark_published(&mut self, open_time_ms: i64, now_ms: Option<i64>) -> CoreResult<()> {
        require_epoch_ms(open_time_ms, "last_published_open_time_ms")?;
        if !self.loaded {
            self.load()?;
        }
        self.meta.last_published_open_time_ms = open_time_ms;
        self.save(now_ms)
    }

    /// Set the stream heartbeat written by the next [`Self::save`]. It survives an
    /// intervening [`Self::load`].
    pub fn set_stream_heartbeat(&mut self, heartbeat_ms: i64) {
        self.heartbeat = Some(heartbeat_ms);
        self.meta.last_stream_heartbeat = heartbeat_ms;
    }

    /// Row count and last close for operators.
    pub fn summary(&self) -> CacheSummary {
        CacheSummary {
            symbol: self.symbol.clone(),
            tf: self.tf,
            rows: self.rows.len(),
            last_close_time_ms: self.meta.last_close_time_ms,
        }
    }

    fn read_meta(&self) -> CoreResult<CacheMeta> {
        match fs::read_to_string(self.meta_path()) {
            Ok(text) => CacheMeta::parse(&text),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(CacheMeta::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn read_rows(&self) -> CoreResult<Vec<Bar>> {
        let path = self.csv_path();
        let mut reader = match csv::Reader::from_path(&path) {
            Ok(r) => r,
            Err(e) => {
                if let csv::ErrorKind::Io(io) = e.kind() {
                    if io.kind() == ErrorKind::NotFound {
                        return Ok(Vec::new());
                    }
                }
                return Err(e.into());
            }
        };

        let header = reader.headers()?;
        if !header.iter().eq(CACHE_COLUMNS.iter().copied()) {
            return Err(CoreError::contract(format!(
                "{}: header does not match cache columns",
                path.display()
            )));
        }

        let mut rows = Vec::new();
        for (idx, record) in reader.deserialize::<Bar>().enumerate() {
            let bar = record
                .map_err(|e| CoreError::contract(format!("{} row {}: {e}", path.display(), idx + 1)))?;
            if bar.symbol != self.symbol || bar.tf != self.tf {
                return Err(CoreError::contract(format!(
                    "{} row {}: binding {}/{} does not match {}/{}",
                    path.display(),
                    idx + 1,
                    bar.symbol,
                    bar.tf,
                    self.symbol,
                    self.tf
                )));
            }
            require_epoch_ms(bar.open_time_ms, "open_time_ms")?;
            validate_geometry(self.tf, bar.open_time_ms, bar.close_time_ms)?;
            let prices = [
                ("open", bar.open),
                ("high", bar.high),
                ("low", bar.low),
                ("close", bar.close),
                ("volume", bar.volume),
            ];
            if let Some((field, _)) = prices.iter().find(|(_, v)| !v.is_finite()) {
                return Err(CoreError::contract(format!(
                    "{} row {}: {field} must be a finite number",
                    path.display(),
                    idx + 1
                )));
            }
            rows.push(bar);
        }
        ensure_sorted_unique(&rows)?;
        Ok(rows)
    }
}

fn write_csv(path: &Path, rows: &[Bar]) -> CoreResult<()> {
    atomic_write_with(path, |file| {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        writer.write_record(CACHE_COLUMNS)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    })
}
