//! Pipeline orchestration
//!
//! This module provides the public API for Percept Trend. It runs an exported
//! document through extraction, outlier filtering, windowing and threshold
//! resolution, and hands the results to the encoder.

use serde_json::Value;

use crate::config::FilterConfig;
use crate::encoder::ReportEncoder;
use crate::error::Result;
use crate::loader::Loader;
use crate::navigator::Document;
use crate::outlier::OutlierStrategy;
use crate::sanitizer::{extract_sessions, ExcludedKeys};
use crate::sessions::SessionExtractor;
use crate::thresholds::ThresholdResolver;
use crate::trend::TrendLogBuilder;
use crate::types::{
    Hemisphere, HemisphereTrend, SessionChannels, SessionReport, StageCounts, TrendReport,
    TrendSeries,
};
use crate::window;

/// Build the filtered trend report for both hemispheres.
///
/// Pipeline stages per hemisphere:
/// 1. TrendLogBuilder - Flatten and sort the trend log
/// 2. OutlierStrategy - Mask or drop outlying LFP values
/// 3. window::apply - Keep the trailing window, if configured
/// 4. ThresholdResolver - Attach the active group's alert bounds
pub fn trend_report(document: &Document, config: &FilterConfig) -> Result<TrendReport> {
    config.validate()?;

    // Extract both sides before filtering so a malformed log emits nothing
    let left = TrendLogBuilder::build(document, Hemisphere::Left)?;
    let right = TrendLogBuilder::build(document, Hemisphere::Right)?;

    Ok(TrendReport {
        left: filter_hemisphere(document, left, config),
        right: filter_hemisphere(document, right, config),
    })
}

fn filter_hemisphere(
    document: &Document,
    series: TrendSeries,
    config: &FilterConfig,
) -> HemisphereTrend {
    let extracted = series.len();
    let series = config.outlier.filter(&series);
    let after_outliers = series.len();
    let series = match config.window() {
        Some(span) => window::apply(&series, span),
        None => series,
    };

    let counts = StageCounts {
        extracted,
        after_outliers,
        after_window: series.len(),
        missing_values: series.missing_values(),
    };
    log::info!(
        "{} hemisphere: {} extracted, {} after {} filter, {} in window",
        series.hemisphere,
        counts.extracted,
        counts.after_outliers,
        config.outlier.name(),
        counts.after_window
    );

    HemisphereTrend {
        thresholds: ThresholdResolver::resolve(document, series.hemisphere),
        series,
        counts,
    }
}

/// Extract BrainSense sessions and filter the LFP value of each channel.
///
/// Amplitudes are left as recorded and time windows do not apply, since
/// session time is relative to the first sample.
pub fn session_report(document: &Document, config: &FilterConfig) -> Result<SessionReport> {
    config.validate()?;

    let extracted = SessionExtractor::extract(document)?;

    let sessions = extracted
        .sessions
        .into_iter()
        .map(|session| SessionChannels {
            left: config.outlier.filter(&session.left),
            right: config.outlier.filter(&session.right),
            ..session
        })
        .collect();

    Ok(SessionReport {
        sessions,
        skipped: extracted.skipped,
    })
}

/// Sanitize every `GroupHistory` session with the default excluded keys
pub fn sanitized_sessions(document: &Document) -> Result<Vec<Value>> {
    let sessions = extract_sessions(document, &ExcludedKeys::default())?;
    log::info!("sanitized {} sessions", sessions.len());
    Ok(sessions)
}

/// Convert a raw export into a JSON trend export.
///
/// # Example
/// ```ignore
/// let export = trend_to_json(raw_json, &FilterConfig::new(OutlierMethod::iqr()))?;
/// ```
pub fn trend_to_json(raw_json: &str, config: &FilterConfig) -> Result<String> {
    let document = Loader::from_json(raw_json)?;
    let report = trend_report(&document, config)?;
    ReportEncoder::new().trend_to_json(report, config)
}

/// Convert a raw export into a JSON session export
pub fn brainsense_to_json(raw_json: &str, config: &FilterConfig) -> Result<String> {
    let document = Loader::from_json(raw_json)?;
    let report = session_report(&document, config)?;
    ReportEncoder::new().sessions_to_json(report, config)
}

/// Convert a raw export into the sanitized `GroupHistory` array (4-space indent)
pub fn sessions_to_json(raw_json: &str) -> Result<String> {
    let document = Loader::from_json(raw_json)?;
    let sessions = sanitized_sessions(&document)?;
    crate::render::sessions_to_pretty_json(&sessions)
}
