//! Error types for Percept Trend

use thiserror::Error;

/// Errors that can occur while processing an exported document
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed input at {path}: {reason}")]
    MalformedInput { path: String, reason: String },

    #[error("Invalid filter configuration: {0}")]
    InvalidConfig(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

impl PipelineError {
    /// Build a `MalformedInput` error for the given document path
    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        PipelineError::MalformedInput {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
