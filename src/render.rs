//! Text and JSON rendering
//!
//! Human-readable renderings of pipeline output: the sanitized session export,
//! a flattened `path = value` listing of the same, and plain-text tables of
//! trend and session series with their alert thresholds.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::fmt::Write;

use crate::error::{PipelineError, Result};
use crate::types::{
    Hemisphere, HemisphereTrend, SessionChannels, SessionReport, ThresholdPair, TrendReport,
};

/// Sanitized sessions as a JSON array indented by four spaces
pub fn sessions_to_pretty_json(sessions: &[Value]) -> Result<String> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    sessions
        .serialize(&mut serializer)
        .map_err(|e| PipelineError::EncodingError(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| PipelineError::EncodingError(e.to_string()))
}

/// One `path = value` line per leaf, in document order.
///
/// Paths look like `[0].Groups[1].Name`; empty objects and arrays are leaves
/// rendered as `{}` and `[]`.
pub fn flatten_sessions(sessions: &[Value]) -> String {
    let mut out = String::new();
    let mut stack: Vec<(String, &Value)> = sessions
        .iter()
        .enumerate()
        .rev()
        .map(|(i, s)| (format!("[{i}]"), s))
        .collect();

    while let Some((path, node)) = stack.pop() {
        match node {
            Value::Object(map) if !map.is_empty() => {
                stack.extend(map.iter().rev().map(|(k, v)| (format!("{path}.{k}"), v)));
            }
            Value::Array(items) if !items.is_empty() => {
                stack.extend(
                    items
                        .iter()
                        .enumerate()
                        .rev()
                        .map(|(i, v)| (format!("{path}[{i}]"), v)),
                );
            }
            leaf => {
                let _ = writeln!(out, "{path} = {leaf}");
            }
        }
    }

    out
}

/// Plain-text table of both hemispheres of a trend report
pub fn trend_table(report: &TrendReport) -> String {
    let mut out = String::new();
    for hemisphere in Hemisphere::ALL {
        write_trend_block(&mut out, report.hemisphere(hemisphere));
    }
    out
}

fn write_trend_block(out: &mut String, trend: &HemisphereTrend) {
    let series = &trend.series;
    let _ = writeln!(out, "LFP and Stimulation Amplitude - {} Hemisphere", series.hemisphere);
    write_thresholds(out, &trend.thresholds);
    let _ = writeln!(
        out,
        "Records: {} extracted, {} after outlier filter, {} in window, {} missing values",
        trend.counts.extracted,
        trend.counts.after_outliers,
        trend.counts.after_window,
        trend.counts.missing_values
    );

    if series.is_empty() {
        let _ = writeln!(out, "  (no data)\n");
        return;
    }

    let _ = writeln!(out, "  {:<20}  {:>12}  {:>14}", "Time (UTC)", "LFP", "Amplitude (mA)");
    for record in &series.records {
        let _ = writeln!(
            out,
            "  {:<20}  {:>12}  {:>14}",
            record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            format_value(record.value),
            format_value(record.amplitude)
        );
    }
    out.push('\n');
}

/// Plain-text table of every session with both channels side by side
pub fn session_table(report: &SessionReport) -> String {
    let mut out = String::new();
    for session in &report.sessions {
        write_session_block(&mut out, session);
    }
    for skipped in &report.skipped {
        let _ = writeln!(
            out,
            "Skipped session {} due to insufficient data ({} samples)",
            skipped.ordinal, skipped.sample_count
        );
    }
    out
}

fn write_session_block(out: &mut String, session: &SessionChannels) {
    let _ = write!(out, "Session {}: LFP and Stimulation Analysis", session.ordinal);
    if let Some(started) = session.first_packet_at {
        let _ = write!(out, " ({})", started.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    out.push('\n');

    let _ = writeln!(
        out,
        "  {:>10}  {:>10}  {:>10}  {:>10}  {:>10}",
        "Time (s)", "LFP L", "LFP R", "mA L", "mA R"
    );
    for (left, right) in session.left.records.iter().zip(&session.right.records) {
        let _ = writeln!(
            out,
            "  {:>10.3}  {:>10}  {:>10}  {:>10}  {:>10}",
            left.timestamp,
            format_value(left.value),
            format_value(right.value),
            format_value(left.amplitude),
            format_value(right.amplitude)
        );
    }
    out.push('\n');
}

fn write_thresholds(out: &mut String, thresholds: &ThresholdPair) {
    let _ = writeln!(
        out,
        "Thresholds: upper = {}, lower = {}",
        format_threshold(thresholds.upper),
        format_threshold(thresholds.lower)
    );
}

/// One line per hemisphere, e.g. `Left: upper = 80, lower = 20`
pub fn thresholds_text(left: &ThresholdPair, right: &ThresholdPair) -> String {
    [(Hemisphere::Left, left), (Hemisphere::Right, right)]
        .iter()
        .map(|(hemisphere, pair)| {
            format!(
                "{}: upper = {}, lower = {}\n",
                hemisphere,
                format_threshold(pair.upper),
                format_threshold(pair.lower)
            )
        })
        .collect()
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "-".to_string()
    } else {
        format!("{value}")
    }
}

fn format_threshold(value: Option<f64>) -> String {
    value.map_or_else(|| "none".to_string(), |v| format!("{v}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SessionChannel, SkippedSession, StageCounts, TimeSeriesRecord, TrendSeries};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_pretty_json_uses_four_spaces() {
        let rendered = sessions_to_pretty_json(&[json!({ "b": 1, "a": [true] })]).unwrap();
        assert_eq!(
            rendered,
            "[\n    {\n        \"b\": 1,\n        \"a\": [\n            true\n        ]\n    }\n]"
        );
    }

    #[test]
    fn test_flatten_sessions() {
        let sessions = vec![
            json!({ "Name": "A", "Groups": [ { "Active": true }, [] ], "Empty": {} }),
            json!(7),
        ];

        assert_eq!(
            flatten_sessions(&sessions),
            "[0].Name = \"A\"\n\
             [0].Groups[0].Active = true\n\
             [0].Groups[1] = []\n\
             [0].Empty = {}\n\
             [1] = 7\n"
        );
    }

    #[test]
    fn test_trend_table_marks_missing_values() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        let report = TrendReport {
            left: HemisphereTrend {
                series: TrendSeries::new(
                    Hemisphere::Left,
                    vec![TimeSeriesRecord::new(ts, f64::NAN, 2.5)],
                ),
                thresholds: ThresholdPair { upper: Some(80.0), lower: Some(20.0) },
                counts: StageCounts { extracted: 1, after_outliers: 1, after_window: 1, missing_values: 1 },
            },
            right: HemisphereTrend {
                series: TrendSeries::empty(Hemisphere::Right),
                thresholds: ThresholdPair::default(),
                counts: StageCounts::default(),
            },
        };

        let table = trend_table(&report);

        assert!(table.contains("Left Hemisphere"));
        assert!(table.contains("Thresholds: upper = 80, lower = 20"));
        assert!(table.contains("2024-01-15 10:00:00"));
        assert!(table.contains("             -             2.5"));
        assert!(table.contains("Thresholds: upper = none, lower = none"));
        assert!(table.contains("(no data)"));
    }

    #[test]
    fn test_session_table() {
        let report = SessionReport {
            sessions: vec![SessionChannels {
                ordinal: 1,
                first_packet_at: None,
                sample_count: 1,
                left: SessionChannel::new(Hemisphere::Left, vec![TimeSeriesRecord::new(0.5, 12.0, 1.5)]),
                right: SessionChannel::new(
                    Hemisphere::Right,
                    vec![TimeSeriesRecord::new(0.5, f64::NAN, f64::NAN)],
                ),
            }],
            skipped: vec![SkippedSession { ordinal: 2, sample_count: 1 }],
        };

        let table = session_table(&report);

        assert!(table.starts_with("Session 1: LFP and Stimulation Analysis\n"));
        assert!(table.contains("       0.500          12           -         1.5           -"));
        assert!(table.contains("Skipped session 2 due to insufficient data (1 samples)"));
    }

    #[test]
    fn test_thresholds_text() {
        let text = thresholds_text(
            &ThresholdPair { upper: Some(80.0), lower: Some(20.0) },
            &ThresholdPair::default(),
        );
        assert_eq!(text, "Left: upper = 80, lower = 20\nRight: upper = none, lower = none\n");
    }
}
