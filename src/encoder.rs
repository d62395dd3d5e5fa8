//! Export encoding
//!
//! Wraps pipeline reports in a versioned JSON envelope that records who
//! produced the export, when, and with which filter settings. Missing values
//! are written as `null`.

use chrono::Utc;
use uuid::Uuid;

use crate::config::FilterConfig;
use crate::error::{PipelineError, Result};
use crate::types::{ExportProducer, SessionExport, SessionReport, TrendExport, TrendReport};
use crate::{PRODUCER_NAME, TREND_VERSION};

/// Current export envelope version
pub const EXPORT_VERSION: &str = "1.0.0";

/// Encoder for export envelopes
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    fn producer(&self) -> ExportProducer {
        ExportProducer {
            name: PRODUCER_NAME.to_string(),
            version: TREND_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        }
    }

    pub fn encode_trend(&self, report: TrendReport, config: &FilterConfig) -> TrendExport {
        TrendExport {
            export_version: EXPORT_VERSION.to_string(),
            producer: self.producer(),
            computed_at_utc: Utc::now().to_rfc3339(),
            filter: *config,
            report,
        }
    }

    pub fn encode_sessions(&self, report: SessionReport, config: &FilterConfig) -> SessionExport {
        SessionExport {
            export_version: EXPORT_VERSION.to_string(),
            producer: self.producer(),
            computed_at_utc: Utc::now().to_rfc3339(),
            filter: *config,
            report,
        }
    }

    /// Encode a trend report to compact JSON
    pub fn trend_to_json(&self, report: TrendReport, config: &FilterConfig) -> Result<String> {
        serde_json::to_string(&self.encode_trend(report, config))
            .map_err(|e| PipelineError::EncodingError(e.to_string()))
    }

    /// Encode a session report to compact JSON
    pub fn sessions_to_json(&self, report: SessionReport, config: &FilterConfig) -> Result<String> {
        serde_json::to_string(&self.encode_sessions(report, config))
            .map_err(|e| PipelineError::EncodingError(e.to_string()))
    }
}
