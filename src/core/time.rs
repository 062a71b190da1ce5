//! Calendar conversions for epoch-millisecond timestamps.
//!
//! All timestamps in the canonical model are UTC milliseconds. Metrics that
//! bucket by hour, weekday, or calendar day view them through a configurable
//! fixed offset (`AnalysisConfig::utc_offset_minutes`).

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Offset, TimeZone, Timelike, Utc};

pub const MS_PER_DAY: i64 = 86_400_000;
pub const MS_PER_HOUR: i64 = 3_600_000;
pub const MS_PER_MINUTE: i64 = 60_000;

/// Build the local-view offset, clamped to the valid UTC offset range.
pub fn local_offset(offset_minutes: i32) -> FixedOffset {
    let clamped = offset_minutes.clamp(-14 * 60, 14 * 60);
    FixedOffset::east_opt(clamped * 60).unwrap_or_else(|| Utc.fix())
}

pub fn local_datetime(timestamp_ms: i64, offset: FixedOffset) -> DateTime<FixedOffset> {
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .unwrap_or_default()
        .with_timezone(&offset)
}

/// Calendar month key in `YYYY-MM` form.
pub fn month_key(timestamp_ms: i64, offset: FixedOffset) -> String {
    let dt = local_datetime(timestamp_ms, offset);
    format!("{:04}-{:02}", dt.year(), dt.month())
}

pub fn local_date(timestamp_ms: i64, offset: FixedOffset) -> NaiveDate {
    local_datetime(timestamp_ms, offset).date_naive()
}

/// Hour of day 0-23 in the local view.
pub fn local_hour(timestamp_ms: i64, offset: FixedOffset) -> u32 {
    local_datetime(timestamp_ms, offset).hour()
}

/// Weekday index with Monday = 0 .. Sunday = 6.
pub fn local_weekday(timestamp_ms: i64, offset: FixedOffset) -> usize {
    local_datetime(timestamp_ms, offset)
        .weekday()
        .num_days_from_monday() as usize
}

pub fn is_weekend(timestamp_ms: i64, offset: FixedOffset) -> bool {
    local_weekday(timestamp_ms, offset) >= 5
}
