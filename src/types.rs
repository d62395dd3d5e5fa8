//! Core types for the Percept Trend pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: hemisphere-tagged time series, threshold pairs, per-session
//! channels, and the export envelopes handed to renderers.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::FilterConfig;

/// Brain hemisphere a sensing channel or trend log belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Hemisphere {
    Left,
    Right,
}

impl Hemisphere {
    /// Both hemispheres, left first
    pub const ALL: [Hemisphere; 2] = [Hemisphere::Left, Hemisphere::Right];

    pub fn as_str(&self) -> &'static str {
        match self {
            Hemisphere::Left => "Left",
            Hemisphere::Right => "Right",
        }
    }

    /// Location identifier used by the device export, e.g. `HemisphereLocationDef.Left`
    pub fn location_key(&self) -> &'static str {
        match self {
            Hemisphere::Left => "HemisphereLocationDef.Left",
            Hemisphere::Right => "HemisphereLocationDef.Right",
        }
    }
}

impl std::fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single observation in a hemisphere series.
///
/// `value` and `amplitude` use `f64::NAN` when the device recorded nothing for
/// the field. Zero is a real observation and is never used as a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeSeriesRecord<T> {
    pub timestamp: T,
    /// LFP signal value
    pub value: f64,
    /// Stimulation amplitude (mA)
    pub amplitude: f64,
}

impl<T> TimeSeriesRecord<T> {
    pub fn new(timestamp: T, value: f64, amplitude: f64) -> Self {
        Self {
            timestamp,
            value,
            amplitude,
        }
    }

    /// Whether the LFP value is the missing-value sentinel
    pub fn value_missing(&self) -> bool {
        self.value.is_nan()
    }
}

/// Ordered records for one hemisphere
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HemisphereSeries<T> {
    pub hemisphere: Hemisphere,
    pub records: Vec<TimeSeriesRecord<T>>,
}

/// Trend-log series keyed by wall-clock time
pub type TrendSeries = HemisphereSeries<DateTime<Utc>>;

/// Session channel keyed by elapsed seconds from the first sample
pub type SessionChannel = HemisphereSeries<f64>;

impl<T> HemisphereSeries<T> {
    pub fn new(hemisphere: Hemisphere, records: Vec<TimeSeriesRecord<T>>) -> Self {
        Self {
            hemisphere,
            records,
        }
    }

    pub fn empty(hemisphere: Hemisphere) -> Self {
        Self::new(hemisphere, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// LFP values in record order, including missing-value sentinels
    pub fn values(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.value).collect()
    }

    /// Number of records whose LFP value is missing
    pub fn missing_values(&self) -> usize {
        self.records.iter().filter(|r| r.value_missing()).count()
    }
}

/// Alert bounds configured for one hemisphere
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ThresholdPair {
    pub upper: Option<f64>,
    pub lower: Option<f64>,
}

impl ThresholdPair {
    pub fn is_empty(&self) -> bool {
        self.upper.is_none() && self.lower.is_none()
    }
}

/// Record counts observed at each filtering stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StageCounts {
    /// Records extracted from the trend log
    pub extracted: usize,
    /// Records left after outlier filtering
    pub after_outliers: usize,
    /// Records left after the trailing window
    pub after_window: usize,
    /// Records whose value is missing in the final series
    pub missing_values: usize,
}

/// Filtered trend data and thresholds for one hemisphere
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HemisphereTrend {
    pub series: TrendSeries,
    pub thresholds: ThresholdPair,
    pub counts: StageCounts,
}

/// Result of running the trend pipeline over both hemispheres
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReport {
    pub left: HemisphereTrend,
    pub right: HemisphereTrend,
}

impl TrendReport {
    pub fn hemisphere(&self, hemisphere: Hemisphere) -> &HemisphereTrend {
        match hemisphere {
            Hemisphere::Left => &self.left,
            Hemisphere::Right => &self.right,
        }
    }
}

/// Parallel left/right channels extracted from one streaming session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionChannels {
    /// 1-based position of the session in the export
    pub ordinal: usize,
    /// When the device recorded the first packet, if exported
    pub first_packet_at: Option<DateTime<Utc>>,
    /// Number of samples in the session
    pub sample_count: usize,
    pub left: SessionChannel,
    pub right: SessionChannel,
}

impl SessionChannels {
    pub fn channel(&self, hemisphere: Hemisphere) -> &SessionChannel {
        match hemisphere {
            Hemisphere::Left => &self.left,
            Hemisphere::Right => &self.right,
        }
    }
}

/// Session left out of processing because it had too few samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SkippedSession {
    pub ordinal: usize,
    pub sample_count: usize,
}

/// Result of extracting all streaming sessions from a document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionReport {
    pub sessions: Vec<SessionChannels>,
    pub skipped: Vec<SkippedSession>,
}

/// Producer metadata attached to every export
#[derive(Debug, Clone, Serialize)]
pub struct ExportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Export envelope around a trend report
#[derive(Debug, Clone, Serialize)]
pub struct TrendExport {
    pub export_version: String,
    pub producer: ExportProducer,
    pub computed_at_utc: String,
    pub filter: FilterConfig,
    pub report: TrendReport,
}

/// Export envelope around a session report
#[derive(Debug, Clone, Serialize)]
pub struct SessionExport {
    pub export_version: String,
    pub producer: ExportProducer,
    pub computed_at_utc: String,
    pub filter: FilterConfig,
    pub report: SessionReport,
}
