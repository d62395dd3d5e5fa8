//! Percept Trend - LFP telemetry extraction from neurostimulator session exports
//!
//! Percept Trend turns a device session export into analysis-ready series
//! through a deterministic pipeline: document loading → trend/session
//! extraction → outlier filtering → time windowing → threshold resolution →
//! export encoding.
//!
//! ## Modules
//!
//! - **Trend pipeline**: Chronic LFP trend logs per hemisphere with alert thresholds
//! - **BrainSense sessions**: In-clinic streaming recordings with relative timestamps
//! - **Session sanitizer**: `GroupHistory` export with bulky spectral arrays removed

pub mod config;
pub mod encoder;
pub mod error;
pub mod loader;
pub mod navigator;
pub mod outlier;
pub mod pipeline;
pub mod render;
pub mod sanitizer;
pub mod sessions;
pub mod thresholds;
pub mod trend;
pub mod types;
pub mod window;

pub use config::FilterConfig;
pub use error::PipelineError;
pub use loader::Loader;
pub use navigator::Document;
pub use outlier::{OutlierMethod, OutlierStrategy};
pub use pipeline::{
    brainsense_to_json, sanitized_sessions, session_report, sessions_to_json, trend_report,
    trend_to_json,
};

/// Crate version embedded in all exports
pub const TREND_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for exports
pub const PRODUCER_NAME: &str = "percept-trend";
