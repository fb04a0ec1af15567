//! Read-mostly holder for the live calendar.
//!
//! Readers call [`CalendarHandle::load`] and get an `Arc<TradingCalendar>` snapshot
//! without locking. A reload builds a fresh calendar and publishes it with
//! [`CalendarHandle::swap`]; readers see either the old or the new one, never a mix.
//!
//! Implementation notes:
//! - Uses `arc-swap` for the atomic pointer swap (no RwLock).
//! - A rebuilt calendar that failed to initialize is rejected by
//!   [`CalendarHandle::reload_from_file`] so a bad edit never replaces a healthy one.

use std::{path::Path, sync::Arc};

use arc_swap::ArcSwap;

use crate::{
    calendar::TradingCalendar,
    error::{CoreError, CoreResult},
};

/// Atomically replaceable calendar snapshot.
#[derive(Debug)]
pub struct CalendarHandle {
    current: ArcSwap<TradingCalendar>,
}

impl CalendarHandle {
    /// Wrap an initial calendar.
    pub fn new(calendar: TradingCalendar) -> Self {
        Self { current: ArcSwap::from_pointee(calendar) }
    }

    /// Current snapshot.
    pub fn load(&self) -> Arc<TradingCalendar> {
        self.current.load_full()
    }

    /// Publish `calendar`, returning the previous snapshot.
    pub fn swap(&self, calendar: TradingCalendar) -> Arc<TradingCalendar> {
        let tag = calendar.calendar_tag().to_string();
        let prev = self.current.swap(Arc::new(calendar));
        tracing::info!(calendar_tag = %tag, "calendar swapped");
        prev
    }

    /// Rebuild profile `tag` from `path` and publish it if healthy.
    pub fn reload_from_file(&self, path: impl AsRef<Path>, tag: &str) -> CoreResult<()> {
        let next = TradingCalendar::from_overrides_file(path, tag)?;
        if let Some(err) = next.health_error() {
            return Err(CoreError::input(format!("rebuilt calendar {tag} is unhealthy: {err}")));
        }
        self.swap(next);
        Ok(())
    }
}
