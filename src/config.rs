//! Filter configuration
//!
//! A [`FilterConfig`] is built once per invocation (from CLI flags or a JSON
//! file) and passed explicitly to every pipeline stage.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::outlier::OutlierMethod;

/// Outlier strategy plus optional trailing window
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub outlier: OutlierMethod,
    /// Trailing window length in seconds; `None` keeps the full history
    #[serde(default)]
    pub window_secs: Option<i64>,
}

impl FilterConfig {
    pub fn new(outlier: OutlierMethod) -> Self {
        Self {
            outlier,
            window_secs: None,
        }
    }

    /// Restrict trend output to `window` before the latest record
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window_secs = Some(window.num_seconds());
        self
    }

    /// Trailing window, if set and representable
    pub fn window(&self) -> Option<Duration> {
        self.window_secs.and_then(Duration::try_seconds)
    }

    /// Parse a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let config: FilterConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Reject parameters no strategy can work with
    pub fn validate(&self) -> Result<()> {
        match self.outlier {
            OutlierMethod::None => {}
            OutlierMethod::RobustZScore { threshold, epsilon } => {
                if !(threshold.is_finite() && threshold > 0.0) {
                    return Err(PipelineError::InvalidConfig(format!(
                        "z-score threshold must be a positive number, got {threshold}"
                    )));
                }
                if !(epsilon.is_finite() && epsilon > 0.0) {
                    return Err(PipelineError::InvalidConfig(format!(
                        "MAD epsilon must be a positive number, got {epsilon}"
                    )));
                }
            }
            OutlierMethod::Iqr { multiplier } => {
                if !(multiplier.is_finite() && multiplier >= 0.0) {
                    return Err(PipelineError::InvalidConfig(format!(
                        "IQR multiplier must be a non-negative number, got {multiplier}"
                    )));
                }
            }
        }

        if let Some(secs) = self.window_secs {
            if secs < 0 {
                return Err(PipelineError::InvalidConfig(format!(
                    "time window must not be negative, got {secs}s"
                )));
            }
            if Duration::try_seconds(secs).is_none() {
                return Err(PipelineError::InvalidConfig(format!(
                    "time window of {secs}s is out of range"
                )));
            }
        }

        Ok(())
    }
}
