//! bucket.rs — bar bucket mapping on epoch milliseconds
//!
//! - Fixed-width frames align to the Unix epoch: `open = ts - ts % tf_ms`.
//! - A bar's inclusive close is `open + tf_ms - 1`.
//! - `1d` bars can instead follow the trading day, which starts at the local
//!   daily-break boundary of a [`TradingCalendar`].

use crate::{
    calendar::TradingCalendar,
    error::{CoreError, CoreResult},
    timeframe::Timeframe,
};

/// Floor `ts` to the start of its fixed-width bucket.
pub fn floor_to_bucket_ms(ts: i64, tf: Timeframe) -> i64 {
    ts - ts.rem_euclid(tf.ms())
}

/// Inclusive close of the fixed-width bucket containing `ts`.
pub fn bucket_close_ms(ts: i64, tf: Timeframe) -> i64 {
    floor_to_bucket_ms(ts, tf) + tf.ms() - 1
}

/// Enforce bar geometry: aligned open, close exactly one ms before the next open.
pub fn validate_geometry(tf: Timeframe, open_time_ms: i64, close_time_ms: i64) -> CoreResult<()> {
    let tf_ms = tf.ms();
    if open_time_ms.rem_euclid(tf_ms) != 0 {
        return Err(CoreError::contract(format!(
            "open_time_ms {open_time_ms} is not aligned to {tf} ({tf_ms} ms)"
        )));
    }
    let expected_close = open_time_ms + tf_ms - 1;
    if close_time_ms != expected_close {
        return Err(CoreError::contract(format!(
            "close_time_ms must equal open_time_ms + tf_ms - 1 ({expected_close}), got {close_time_ms}"
        )));
    }
    Ok(())
}

/// Bucket open for `ts`; `1d` follows the trading-day boundary and needs a calendar.
pub fn bucket_open_ms(tf: Timeframe, ts: i64, calendar: Option<&TradingCalendar>) -> CoreResult<i64> {
    match tf {
        Timeframe::D1 => {
            let cal = calendar
                .ok_or_else(|| CoreError::input("calendar is required for the 1d boundary"))?;
            Ok(cal.trading_day_boundary_for(ts))
        }
        _ => Ok(floor_to_bucket_ms(ts, tf)),
    }
}

/// Inclusive close for a bucket opened at `open_ms`; `1d` ends one ms before the
/// next trading-day boundary.
pub fn bucket_close_ms_for(
    tf: Timeframe,
    open_ms: i64,
    calendar: Option<&TradingCalendar>,
) -> CoreResult<i64> {
    match tf {
        Timeframe::D1 => {
            let cal = calendar
                .ok_or_else(|| CoreError::input("calendar is required for the 1d boundary"))?;
            Ok(cal.next_trading_day_boundary_ms(open_ms) - 1)
        }
        _ => Ok(open_ms + tf.ms() - 1),
    }
}
