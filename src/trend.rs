//! Trend log extraction
//!
//! Flattens `DiagnosticData.LFPTrendLogs` for one hemisphere into an ordered
//! series of `(timestamp, LFP, amplitude)` records. The export groups samples
//! under opaque bucket keys; bucket order carries no meaning, so records are
//! sorted by timestamp after flattening.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use std::collections::HashSet;

use crate::error::{PipelineError, Result};
use crate::navigator::{format_path, kind_of, Document, Navigate, PathStep};
use crate::path;
use crate::types::{Hemisphere, TimeSeriesRecord, TrendSeries};

const TREND_LOGS: [&str; 2] = ["DiagnosticData", "LFPTrendLogs"];

/// Builder for hemisphere trend series
pub struct TrendLogBuilder;

impl TrendLogBuilder {
    /// Build the trend series for `hemisphere`.
    ///
    /// A document without a log for the hemisphere yields an empty series;
    /// single-hemisphere devices export only one side.
    pub fn build(document: &Document, hemisphere: Hemisphere) -> Result<TrendSeries> {
        let log_path = path![TREND_LOGS[0], TREND_LOGS[1], hemisphere.location_key()];

        let Some(buckets) = document.optional_object(&log_path)? else {
            log::debug!("no trend log for {} hemisphere", hemisphere);
            return Ok(TrendSeries::empty(hemisphere));
        };

        let mut records = Vec::new();
        let mut duplicates = 0usize;

        for (bucket_key, entries) in buckets {
            let bucket_path = [log_path.as_slice(), &[PathStep::Key(bucket_key)]].concat();
            let entries = entries.as_array().ok_or_else(|| {
                PipelineError::malformed(
                    format_path(&bucket_path),
                    format!("trend bucket must be an array, found {}", kind_of(entries)),
                )
            })?;

            // Same-bucket duplicates keep the first occurrence
            let mut seen = HashSet::new();
            for (idx, entry) in entries.iter().enumerate() {
                let entry_path = [bucket_path.as_slice(), &[PathStep::Index(idx)]].concat();
                let record = parse_entry(entry, &entry_path)?;
                if seen.insert(record.timestamp) {
                    records.push(record);
                } else {
                    duplicates += 1;
                    log::debug!(
                        "dropping duplicate timestamp {} at {}",
                        record.timestamp,
                        format_path(&entry_path)
                    );
                }
            }
        }

        // Stable: equal timestamps from different buckets keep bucket order
        records.sort_by_key(|r| r.timestamp);

        log::debug!(
            "{} hemisphere: {} trend records from {} buckets ({} duplicates dropped)",
            hemisphere,
            records.len(),
            buckets.len(),
            duplicates
        );

        Ok(TrendSeries::new(hemisphere, records))
    }
}

fn parse_entry(
    entry: &Value,
    entry_path: &[PathStep<'_>],
) -> Result<TimeSeriesRecord<DateTime<Utc>>> {
    if !entry.is_object() {
        return Err(PipelineError::malformed(
            format_path(entry_path),
            format!("trend entry must be an object, found {}", kind_of(entry)),
        ));
    }

    let raw_time = entry.str_at(&path!["DateTime"]).ok_or_else(|| {
        PipelineError::malformed(format_path(entry_path), "trend entry has no DateTime")
    })?;
    let timestamp = parse_timestamp(raw_time).ok_or_else(|| {
        PipelineError::malformed(
            format_path(entry_path),
            format!("unrecognized DateTime {raw_time:?}"),
        )
    })?;

    Ok(TimeSeriesRecord::new(
        timestamp,
        entry.f64_at(&path!["LFP"]).unwrap_or(f64::NAN),
        entry.f64_at(&path!["AmplitudeInMilliAmps"]).unwrap_or(f64::NAN),
    ))
}

/// Parse an export timestamp.
///
/// Accepts RFC 3339 and offset-less `YYYY-MM-DDTHH:MM:SS[.fff]` or
/// `YYYY-MM-DD HH:MM:SS[.fff]`, the latter two read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
