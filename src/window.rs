//! Trailing time windows
//!
//! Restricts a trend series to the records within a fixed duration of its
//! latest timestamp.

use chrono::{DateTime, Duration, Utc};

use crate::types::TrendSeries;

/// Keep records with `timestamp >= latest - window`
pub fn apply(series: &TrendSeries, window: Duration) -> TrendSeries {
    let Some(cutoff) = cutoff(series, window) else {
        return series.clone();
    };

    let records: Vec<_> = series
        .records
        .iter()
        .filter(|r| r.timestamp >= cutoff)
        .copied()
        .collect();

    log::debug!(
        "{} hemisphere: window cutoff {} kept {} of {} records",
        series.hemisphere,
        cutoff,
        records.len(),
        series.len()
    );

    TrendSeries::new(series.hemisphere, records)
}

/// Compose a window from user-facing weeks, days and hours
pub fn window_from_parts(weeks: u32, days: u32, hours: u32) -> Duration {
    Duration::weeks(i64::from(weeks))
        + Duration::days(i64::from(days))
        + Duration::hours(i64::from(hours))
}

/// Earliest timestamp retained by [`apply`].
///
/// `None` when the series is empty or the window reaches past the earliest
/// representable time; either way every record is kept.
pub fn cutoff(series: &TrendSeries, window: Duration) -> Option<DateTime<Utc>> {
    series
        .records
        .iter()
        .map(|r| r.timestamp)
        .max()
        .and_then(|latest| latest.checked_sub_signed(window))
}
