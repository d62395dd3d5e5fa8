//! BrainSense streaming session extraction
//!
//! Each entry of `BrainSenseLfp` is an in-clinic recording: a flat list of
//! samples keyed by `TicksInMs`, each optionally carrying a `Left` and a
//! `Right` reading. This module splits a recording into two aligned channels
//! with time expressed as seconds elapsed since the earliest sample.

use serde_json::Value;

use crate::error::{PipelineError, Result};
use crate::navigator::{format_path, kind_of, Document, Navigate, PathStep};
use crate::path;
use crate::trend::parse_timestamp;
use crate::types::{
    Hemisphere, SessionChannel, SessionChannels, SessionReport, SkippedSession, TimeSeriesRecord,
};

/// Sessions with fewer samples than this are skipped
pub const MIN_SESSION_SAMPLES: usize = 2;

/// Extractor for BrainSense streaming sessions
pub struct SessionExtractor;

impl SessionExtractor {
    /// Extract every session with enough samples; report the rest as skipped
    pub fn extract(document: &Document) -> Result<SessionReport> {
        let Some(sessions) = document.optional_array(&path!["BrainSenseLfp"])? else {
            log::debug!("document has no BrainSenseLfp sessions");
            return Ok(SessionReport::default());
        };

        let mut report = SessionReport::default();

        for (idx, session) in sessions.iter().enumerate() {
            let ordinal = idx + 1;
            let session_path = path!["BrainSenseLfp", idx];

            if !session.is_object() {
                return Err(PipelineError::malformed(
                    format_path(&session_path),
                    format!("session must be an object, found {}", kind_of(session)),
                ));
            }

            let samples = match session.at(&path!["LfpData"]) {
                None | Some(Value::Null) => &[][..],
                Some(Value::Array(items)) => items.as_slice(),
                Some(other) => {
                    return Err(PipelineError::malformed(
                        format!("{}/LfpData", format_path(&session_path)),
                        format!("expected an array, found {}", kind_of(other)),
                    ))
                }
            };

            if samples.len() < MIN_SESSION_SAMPLES {
                log::warn!(
                    "skipping session {} due to insufficient data ({} samples)",
                    ordinal,
                    samples.len()
                );
                report.skipped.push(SkippedSession {
                    ordinal,
                    sample_count: samples.len(),
                });
                continue;
            }

            report
                .sessions
                .push(build_channels(session, samples, ordinal, &session_path)?);
        }

        log::info!(
            "extracted {} sessions ({} skipped)",
            report.sessions.len(),
            report.skipped.len()
        );

        Ok(report)
    }
}

fn build_channels(
    session: &Value,
    samples: &[Value],
    ordinal: usize,
    session_path: &[PathStep<'_>],
) -> Result<SessionChannels> {
    let mut ticks = Vec::with_capacity(samples.len());
    for (idx, sample) in samples.iter().enumerate() {
        let sample_path = || format!("{}/LfpData/{}", format_path(session_path), idx);
        if !sample.is_object() {
            return Err(PipelineError::malformed(
                sample_path(),
                format!("sample must be an object, found {}", kind_of(sample)),
            ));
        }
        let tick = sample
            .f64_at(&path!["TicksInMs"])
            .ok_or_else(|| PipelineError::malformed(sample_path(), "sample has no TicksInMs"))?;
        ticks.push(tick);
    }

    let origin = ticks.iter().copied().fold(f64::INFINITY, f64::min);

    let channel = |hemisphere: Hemisphere| {
        let mut records: Vec<TimeSeriesRecord<f64>> = samples
            .iter()
            .zip(&ticks)
            .map(|(sample, tick)| {
                let side = hemisphere.as_str();
                TimeSeriesRecord::new(
                    (tick - origin) / 1000.0,
                    sample.f64_at(&path![side, "LFP"]).unwrap_or(f64::NAN),
                    sample.f64_at(&path![side, "mA"]).unwrap_or(f64::NAN),
                )
            })
            .collect();
        records.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        SessionChannel::new(hemisphere, records)
    };

    Ok(SessionChannels {
        ordinal,
        first_packet_at: session
            .str_at(&path!["FirstPacketDateTime"])
            .and_then(parse_timestamp),
        sample_count: samples.len(),
        left: channel(Hemisphere::Left),
        right: channel(Hemisphere::Right),
    })
}
