//! Market-time calendar: closed intervals, overrides profiles, the schedule itself
//! and a swappable handle for runtime reloads.

pub mod handle;
pub mod intervals;
pub mod overrides;
pub mod session;

pub use handle::CalendarHandle;
pub use intervals::{ClosedInterval, normalize_closed_intervals};
pub use overrides::{CalendarOverrides, HolidayPolicy, load_calendar_overrides, validate_holiday_policy};
pub use session::{CalendarSettings, ClosedReason, MarketState, TradingCalendar};
